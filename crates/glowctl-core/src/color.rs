// ── Display colour ──
//
// Approximate on-screen colour of the bulb, for renderers. Uses Tanner
// Helland's curve fit of blackbody colour; good to a few percent between
// 1000 K and 40 000 K.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Colour of a blackbody at `kelvin`.
pub fn kelvin_to_rgb(kelvin: u16) -> Rgb {
    let t = f64::from(kelvin) / 100.0;

    let r = if t <= 66.0 {
        255.0
    } else {
        329.698_727_446 * (t - 60.0).powf(-0.133_204_759_2)
    };
    let g = if t <= 66.0 {
        99.470_802_586_1 * t.ln() - 161.119_568_166_1
    } else {
        288.122_169_528_3 * (t - 60.0).powf(-0.075_514_849_2)
    };
    let b = if t >= 66.0 {
        255.0
    } else if t <= 19.0 {
        0.0
    } else {
        138.517_731_223_1 * (t - 10.0).ln() - 305.044_792_730_7
    };

    Rgb {
        r: channel(r),
        g: channel(g),
        b: channel(b),
    }
}

/// Dim `rgb` to `percent` of full brightness.
pub fn scale_rgb(rgb: Rgb, percent: u16) -> Rgb {
    let factor = f64::from(percent.min(100)) / 100.0;
    Rgb {
        r: channel(f64::from(rgb.r) * factor),
        g: channel(f64::from(rgb.g) * factor),
        b: channel(f64::from(rgb.b) * factor),
    }
}

fn channel(value: f64) -> u8 {
    let clamped = value.round().clamp(0.0, 255.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
    let out = clamped as u8;
    out
}
