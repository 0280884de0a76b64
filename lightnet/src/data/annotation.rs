use crate::common::*;

/// An object annotation in pixel units.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Annotation {
    pub image: String,
    pub class_label: String,
    /// Object identifier within the image.
    pub id: usize,
    pub x_top_left: R64,
    pub y_top_left: R64,
    pub width: R64,
    pub height: R64,
    #[serde(default)]
    pub occluded: bool,
    #[serde(default)]
    pub truncated: bool,
    #[serde(default)]
    pub lost: bool,
    #[serde(default)]
    pub difficult: bool,
    #[serde(default)]
    pub ignore: bool,
    /// Index of the sample within its batch, set by the collate functions.
    #[serde(default)]
    pub batch_number: Option<usize>,
}

impl Annotation {
    pub fn new(
        image: impl Into<String>,
        class_label: impl Into<String>,
        [x_top_left, y_top_left, width, height]: [R64; 4],
    ) -> Self {
        Self {
            image: image.into(),
            class_label: class_label.into(),
            id: 0,
            x_top_left,
            y_top_left,
            width,
            height,
            occluded: false,
            truncated: false,
            lost: false,
            difficult: false,
            ignore: false,
            batch_number: None,
        }
    }

    pub fn x_bottom_right(&self) -> R64 {
        self.x_top_left + self.width
    }

    pub fn y_bottom_right(&self) -> R64 {
        self.y_top_left + self.height
    }

    pub fn area(&self) -> R64 {
        self.width * self.height
    }

    /// Scales the box around the image origin.
    pub fn scale(&mut self, scale_x: R64, scale_y: R64) {
        self.x_top_left *= scale_x;
        self.y_top_left *= scale_y;
        self.width *= scale_x;
        self.height *= scale_y;
    }

    pub fn translate(&mut self, dx: R64, dy: R64) {
        self.x_top_left += dx;
        self.y_top_left += dy;
    }

    /// Mirrors the box within an image of `image_width` pixels.
    pub fn flip_horizontal(&mut self, image_width: R64) {
        self.x_top_left = image_width - self.x_top_left - self.width;
    }
}
