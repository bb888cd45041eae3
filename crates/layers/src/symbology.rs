use crate::category::Category;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MarkerStyle {
    /// Icon name in the renderer's sprite sheet.
    pub icon: &'static str,
    pub color: [f32; 4],
    /// Marker z-order; higher draws on top.
    pub z_index: i32,
}

impl MarkerStyle {
    pub const fn new(icon: &'static str, color: [f32; 4], z_index: i32) -> Self {
        Self {
            icon,
            color,
            z_index,
        }
    }
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            icon: "marker",
            color: [1.0, 1.0, 1.0, 1.0],
            z_index: 0,
        }
    }
}

pub fn style_for(category: Category) -> MarkerStyle {
    match category {
        Category::RestStop => MarkerStyle::new("coffee", [0.55, 0.35, 0.17, 1.0], 1),
        Category::ChargingStation => MarkerStyle::new("bolt", [0.98, 0.76, 0.10, 1.0], 1),
        Category::SpringWater => MarkerStyle::new("tint", [0.16, 0.50, 0.93, 1.0], 1),
        Category::Wifi => MarkerStyle::new("wifi", [0.40, 0.40, 0.40, 1.0], 0),
        Category::Countryside => MarkerStyle::new("leaf", [0.30, 0.65, 0.25, 1.0], 2),
        Category::Campground => MarkerStyle::new("tree", [0.09, 0.25, 0.21, 1.0], 3),
        Category::Campsite => MarkerStyle::new("tent", [0.20, 0.45, 0.30, 1.0], 3),
        Category::AutoCamp => MarkerStyle::new("bus", [0.85, 0.35, 0.20, 1.0], 3),
        Category::Fishing => MarkerStyle::new("fish", [0.10, 0.60, 0.70, 1.0], 2),
        Category::Beach => MarkerStyle::new("umbrella", [0.95, 0.60, 0.30, 1.0], 2),
        Category::Favorite => MarkerStyle::new("star", [0.95, 0.80, 0.00, 1.0], 4),
    }
}

#[cfg(test)]
mod tests {
    use super::style_for;
    use crate::category::Category;

    #[test]
    fn favorites_draw_above_everything() {
        let top = style_for(Category::Favorite).z_index;
        for category in Category::ALL {
            if category != Category::Favorite {
                assert!(style_for(category).z_index < top, "{category}");
            }
        }
    }
}
