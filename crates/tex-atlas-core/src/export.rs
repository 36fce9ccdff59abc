use crate::atlas::AtlasLayout;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Atlas-level metadata shared by the JSON exporters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    /// Schema version for JSON metadata formats; current: "1".
    pub schema_version: String,
    pub app: String,
    pub version: String,
    pub format: String,
    pub power_of_two: bool,
    pub square: bool,
    pub max_dim: (u32, u32),
    pub padding: (u32, u32),
    pub edge_padding: bool,
    pub duplicate_padding: bool,
    pub allow_rotation: bool,
    pub arrayed: bool,
}

impl Meta {
    pub fn from_layout(layout: &AtlasLayout) -> Self {
        let s = &layout.settings;
        Self {
            schema_version: "1".into(),
            app: "tex-atlas".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            format: s.format.label().into(),
            power_of_two: s.power_of_two,
            square: s.square,
            max_dim: (s.max_width, s.max_height),
            padding: (s.padding_x, s.padding_y),
            edge_padding: s.edge_padding,
            duplicate_padding: s.duplicate_padding,
            allow_rotation: s.allow_rotation,
            arrayed: s.arrayed,
        }
    }
}

/// Serialize the layout as `{ pages: [ { id, width, height, frames: [...] } ], meta }`.
pub fn to_json_array(layout: &AtlasLayout) -> Value {
    let pages_val = layout
        .pages
        .iter()
        .map(|p| {
            let frames_val: Vec<Value> = p
                .frames
                .iter()
                .map(|fr| {
                    json!({
                        "name": fr.name,
                        "frame": {"x": fr.rect.x, "y": fr.rect.y, "w": fr.rect.w, "h": fr.rect.h},
                        "rotated": fr.rotated,
                        "sourceSize": {"w": fr.source_size.0, "h": fr.source_size.1},
                    })
                })
                .collect();
            json!({
                "id": p.index,
                "width": p.width,
                "height": p.height,
                "occupancy": p.occupancy,
                "frames": frames_val,
            })
        })
        .collect::<Vec<_>>();
    json!({"pages": pages_val, "meta": Meta::from_layout(layout)})
}

/// Flatten frames keyed by name, with page index/size hints.
/// Shape: `{ frames: { name: { frame, rotated, sourceSize, page, pageSize } }, meta }`.
pub fn to_json_hash(layout: &AtlasLayout) -> Value {
    let mut frames = serde_json::Map::new();
    for page in &layout.pages {
        for fr in &page.frames {
            frames.insert(
                fr.name.clone(),
                json!({
                    "frame": {"x": fr.rect.x, "y": fr.rect.y, "w": fr.rect.w, "h": fr.rect.h},
                    "rotated": fr.rotated,
                    "sourceSize": {"w": fr.source_size.0, "h": fr.source_size.1},
                    "page": page.index,
                    "pageSize": {"w": page.width, "h": page.height},
                }),
            );
        }
    }
    json!({ "frames": frames, "meta": Meta::from_layout(layout) })
}
