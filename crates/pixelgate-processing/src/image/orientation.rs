use image::DynamicImage;
use std::io::Cursor;

/// Image orientation operations (rotation and flipping)
pub struct ImageOrientation;

impl ImageOrientation {
    /// Read the EXIF orientation tag (1-8). Missing, unreadable or out-of-range values
    /// are treated as 1 (upright).
    pub fn read_exif_orientation(data: &[u8]) -> u8 {
        let mut cursor = Cursor::new(data);
        exif::Reader::new()
            .read_from_container(&mut cursor)
            .ok()
            .and_then(|exif| {
                exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
                    .and_then(|field| field.value.get_uint(0))
            })
            .and_then(|value| u8::try_from(value).ok())
            .filter(|value| (1..=8).contains(value))
            .unwrap_or(1)
    }

    /// Get rotation and flip operations needed for a given EXIF orientation
    /// Returns (rotate_angle, flip_horizontal, flip_vertical); flips apply before rotation
    pub fn get_orientation_transforms(orientation: u8) -> (Option<u16>, bool, bool) {
        match orientation {
            1 => (None, false, false),      // Normal
            2 => (None, true, false),       // Mirror horizontal
            3 => (Some(180), false, false), // Rotate 180
            4 => (None, false, true),       // Mirror vertical
            5 => (Some(270), true, false),  // Mirror horizontal + Rotate 270 CW
            6 => (Some(90), false, false),  // Rotate 90 CW
            7 => (Some(90), true, false),   // Mirror horizontal + Rotate 90 CW
            8 => (Some(270), false, false), // Rotate 270 CW
            _ => (None, false, false),      // Invalid, treat as normal
        }
    }

    /// Bake the EXIF orientation of `data` into the decoded pixels of `img`.
    pub fn apply_exif_orientation(img: DynamicImage, data: &[u8]) -> DynamicImage {
        let orientation = Self::read_exif_orientation(data);
        Self::apply_orientation(img, orientation)
    }

    pub fn apply_orientation(mut img: DynamicImage, orientation: u8) -> DynamicImage {
        let (rotate, flip_h, flip_v) = Self::get_orientation_transforms(orientation);

        if orientation != 1 {
            tracing::debug!(
                orientation = orientation,
                rotate = ?rotate,
                flip_horizontal = flip_h,
                flip_vertical = flip_v,
                "Applying EXIF orientation"
            );
        }

        if flip_h {
            img = img.fliph();
        }
        if flip_v {
            img = img.flipv();
        }
        if let Some(angle) = rotate {
            img = Self::rotate_by_angle(img, angle);
        }

        img
    }

    /// Rotate image by specified angle (90, 180, or 270 degrees clockwise)
    pub fn rotate_by_angle(img: DynamicImage, angle: u16) -> DynamicImage {
        match angle {
            90 => img.rotate90(),
            180 => img.rotate180(),
            270 => img.rotate270(),
            _ => img,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, ImageFormat, Rgba, RgbaImage};

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    /// 3x2 image, red top-left pixel, everything else blue
    fn marked_image() -> DynamicImage {
        let mut img = RgbaImage::from_pixel(3, 2, BLUE);
        img.put_pixel(0, 0, RED);
        DynamicImage::ImageRgba8(img)
    }

    fn red_position(img: &DynamicImage) -> (u32, u32) {
        img.pixels()
            .find(|(_, _, p)| *p == RED)
            .map(|(x, y, _)| (x, y))
            .unwrap()
    }

    #[test]
    fn test_rotation_dimension_changes() {
        let img = marked_image();
        assert_eq!(ImageOrientation::rotate_by_angle(img.clone(), 90).dimensions(), (2, 3));
        assert_eq!(ImageOrientation::rotate_by_angle(img.clone(), 180).dimensions(), (3, 2));
        assert_eq!(ImageOrientation::rotate_by_angle(img.clone(), 270).dimensions(), (2, 3));
        assert_eq!(ImageOrientation::rotate_by_angle(img, 45).dimensions(), (3, 2));
    }

    #[test]
    fn test_orientation_pixel_mapping() {
        // Where the stored top-left pixel must land once each orientation is applied
        let expected = [
            (1, (0, 0)),
            (2, (2, 0)),
            (3, (2, 1)),
            (4, (0, 1)),
            (5, (0, 0)),
            (6, (1, 0)),
            (7, (1, 2)),
            (8, (0, 2)),
        ];

        for (orientation, position) in expected {
            let oriented = ImageOrientation::apply_orientation(marked_image(), orientation);
            assert_eq!(red_position(&oriented), position, "orientation {orientation}");
        }
    }

    #[test]
    fn test_invalid_orientation_is_identity() {
        let oriented = ImageOrientation::apply_orientation(marked_image(), 9);
        assert_eq!(oriented.dimensions(), (3, 2));
        assert_eq!(red_position(&oriented), (0, 0));
    }

    #[test]
    fn test_read_orientation_without_exif() {
        let mut buffer = Vec::new();
        marked_image()
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        assert_eq!(ImageOrientation::read_exif_orientation(&buffer), 1);
        assert_eq!(ImageOrientation::read_exif_orientation(b"garbage"), 1);
    }
}
