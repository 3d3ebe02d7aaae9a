//! Bit-plane analysis
//!
//! A lightweight, headless take on what stegsolve shows visually: for each
//! RGB channel and each of the eight bit planes, count how many bits are set.
//! LSB planes that stray far from an even split are flagged as suspicious.

use chrono::Utc;
use image::RgbImage;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StegsolveError {
    #[error("Invalid image format: {0}")]
    InvalidImage(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    Random,
    MostlyOnes,
    MostlyZeros,
    Balanced,
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Pattern::Random => "random",
            Pattern::MostlyOnes => "mostly_ones",
            Pattern::MostlyZeros => "mostly_zeros",
            Pattern::Balanced => "balanced",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Channel::Red => "Red",
            Channel::Green => "Green",
            Channel::Blue => "Blue",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaneStats {
    pub total_bits: u64,
    pub ones: u64,
    pub zeros: u64,
    pub ones_percentage: f64,
    pub pattern: Pattern,
}

#[derive(Debug, Clone, Serialize)]
pub struct BitPlane {
    pub plane: u8,
    pub red: PlaneStats,
    pub green: PlaneStats,
    pub blue: PlaneStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    pub suspicious: bool,
    pub red: PlaneStats,
    pub green: PlaneStats,
    pub blue: PlaneStats,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageAnalysis {
    pub filename: String,
    pub dimensions: Dimensions,
    pub bit_planes: Vec<BitPlane>,
    pub lsb: Detection,
    pub summary: String,
    pub timestamp: String,
}

/// Classify a plane by its share of set bits
pub fn classify(ones_percentage: f64) -> Pattern {
    if ones_percentage > 60.0 {
        Pattern::MostlyOnes
    } else if ones_percentage < 40.0 {
        Pattern::MostlyZeros
    } else if ones_percentage == 50.0 {
        Pattern::Balanced
    } else {
        Pattern::Random
    }
}

/// Statistics for one bit of one channel over every pixel
pub fn plane_stats(image: &RgbImage, channel: Channel, bit: u8) -> PlaneStats {
    let total_bits = image.width() as u64 * image.height() as u64;
    let ones = image
        .pixels()
        .filter(|pixel| (pixel.0[channel.index()] >> bit) & 1 == 1)
        .count() as u64;

    let ones_percentage = if total_bits == 0 {
        0.0
    } else {
        ones as f64 / total_bits as f64 * 100.0
    };

    PlaneStats {
        total_bits,
        ones,
        zeros: total_bits - ones,
        ones_percentage,
        pattern: classify(ones_percentage),
    }
}

pub fn bit_plane(image: &RgbImage, bit: u8) -> BitPlane {
    BitPlane {
        plane: bit,
        red: plane_stats(image, Channel::Red, bit),
        green: plane_stats(image, Channel::Green, bit),
        blue: plane_stats(image, Channel::Blue, bit),
    }
}

/// Flag LSB planes that do not look like noise
pub fn detect(lsb: &BitPlane) -> Detection {
    let mut recommendations = Vec::new();
    let mut suspicious = false;

    for channel in Channel::ALL {
        let stats = match channel {
            Channel::Red => &lsb.red,
            Channel::Green => &lsb.green,
            Channel::Blue => &lsb.blue,
        };

        if stats.pattern != Pattern::Random {
            suspicious = true;
            recommendations.push(format!(
                "{} channel shows {} pattern ({:.1}% ones)",
                channel.label(),
                stats.pattern,
                stats.ones_percentage
            ));
        }

        if stats.ones_percentage > 70.0 || stats.ones_percentage < 30.0 {
            recommendations.push(format!(
                "{} channel has unusual bit distribution",
                channel.label()
            ));
        }
    }

    if !suspicious {
        recommendations.push("No obvious steganographic patterns detected".to_string());
    }

    Detection {
        suspicious,
        red: lsb.red.clone(),
        green: lsb.green.clone(),
        blue: lsb.blue.clone(),
        recommendations,
    }
}

pub fn summary(dimensions: Dimensions, detection: &Detection) -> String {
    let mut text = String::from("Image Analysis Summary:\n");
    text.push_str(&format!(
        "Dimensions: {}x{}\n",
        dimensions.width, dimensions.height
    ));
    text.push_str(&format!(
        "Total pixels: {}\n\n",
        dimensions.width as u64 * dimensions.height as u64
    ));

    text.push_str("LSB Analysis:\n");
    text.push_str(&format!(
        "Red channel: {:.1}% ones\n",
        detection.red.ones_percentage
    ));
    text.push_str(&format!(
        "Green channel: {:.1}% ones\n",
        detection.green.ones_percentage
    ));
    text.push_str(&format!(
        "Blue channel: {:.1}% ones\n\n",
        detection.blue.ones_percentage
    ));

    text.push_str("Recommendations:\n");
    for recommendation in &detection.recommendations {
        text.push_str(&format!("• {recommendation}\n"));
    }

    text
}

/// Decode an image and run the full bit-plane analysis
pub fn analyze_image(filename: &str, bytes: &[u8]) -> Result<ImageAnalysis, StegsolveError> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| StegsolveError::InvalidImage(e.to_string()))?
        .to_rgb8();

    if image.width() == 0 || image.height() == 0 {
        return Err(StegsolveError::InvalidImage("image has no pixels".to_string()));
    }

    let dimensions = Dimensions {
        width: image.width(),
        height: image.height(),
    };

    let bit_planes: Vec<BitPlane> = (0..8).map(|bit| bit_plane(&image, bit)).collect();
    let lsb = detect(&bit_planes[0]);
    let summary = summary(dimensions, &lsb);

    Ok(ImageAnalysis {
        filename: filename.to_string(),
        dimensions,
        bit_planes,
        lsb,
        summary,
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb};
    use std::io::Cursor;

    fn png_bytes(image: RgbImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_classify_thresholds() {
        assert_eq!(classify(60.1), Pattern::MostlyOnes);
        assert_eq!(classify(60.0), Pattern::Random);
        assert_eq!(classify(39.9), Pattern::MostlyZeros);
        assert_eq!(classify(40.0), Pattern::Random);
        assert_eq!(classify(50.0), Pattern::Balanced);
        assert_eq!(classify(49.9), Pattern::Random);
    }

    #[test]
    fn test_plane_stats_counts_bits() {
        // Red LSB set on 3 of 4 pixels; green bit 7 set everywhere
        let image = RgbImage::from_fn(2, 2, |x, y| {
            let red = if x == 0 && y == 0 { 0 } else { 1 };
            Rgb([red, 0x80, 0])
        });

        let red = plane_stats(&image, Channel::Red, 0);
        assert_eq!(red.total_bits, 4);
        assert_eq!(red.ones, 3);
        assert_eq!(red.zeros, 1);
        assert_eq!(red.ones_percentage, 75.0);
        assert_eq!(red.pattern, Pattern::MostlyOnes);

        let green = plane_stats(&image, Channel::Green, 7);
        assert_eq!(green.ones, 4);

        let blue = plane_stats(&image, Channel::Blue, 0);
        assert_eq!(blue.ones, 0);
        assert_eq!(blue.pattern, Pattern::MostlyZeros);
    }

    #[test]
    fn test_detect_flags_skewed_channels() {
        let image = RgbImage::from_fn(4, 4, |x, _| Rgb([1, (x % 2) as u8, 0]));
        let detection = detect(&bit_plane(&image, 0));

        assert!(detection.suspicious);
        assert!(detection
            .recommendations
            .contains(&"Red channel shows mostly_ones pattern (100.0% ones)".to_string()));
        assert!(detection
            .recommendations
            .contains(&"Red channel has unusual bit distribution".to_string()));
        assert!(detection
            .recommendations
            .contains(&"Green channel shows balanced pattern (50.0% ones)".to_string()));
        assert!(detection
            .recommendations
            .contains(&"Blue channel has unusual bit distribution".to_string()));
    }

    #[test]
    fn test_detect_clean_image() {
        // 45% ones in every channel: random, nothing unusual
        let image = RgbImage::from_fn(20, 1, |x, _| {
            let v = if x < 9 { 1 } else { 0 };
            Rgb([v, v, v])
        });
        let detection = detect(&bit_plane(&image, 0));

        assert!(!detection.suspicious);
        assert_eq!(
            detection.recommendations,
            vec!["No obvious steganographic patterns detected".to_string()]
        );
    }

    #[test]
    fn test_analyze_image_png() {
        let bytes = png_bytes(RgbImage::from_pixel(3, 2, Rgb([255, 254, 1])));
        let analysis = analyze_image("tiny.png", &bytes).unwrap();

        assert_eq!(analysis.filename, "tiny.png");
        assert_eq!(analysis.dimensions.width, 3);
        assert_eq!(analysis.dimensions.height, 2);
        assert_eq!(analysis.bit_planes.len(), 8);
        assert_eq!(analysis.bit_planes[1].green.ones, 6);
        assert_eq!(analysis.lsb.green.ones, 0);
        assert!(analysis.summary.contains("Dimensions: 3x2"));
        assert!(analysis.summary.contains("Total pixels: 6"));
        assert!(analysis.summary.contains("Red channel: 100.0% ones"));
    }

    #[test]
    fn test_analyze_rejects_non_images() {
        let err = analyze_image("notes.txt", b"definitely not an image").unwrap_err();
        assert!(matches!(err, StegsolveError::InvalidImage(_)));
    }
}
