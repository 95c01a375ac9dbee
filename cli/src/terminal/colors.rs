use colored::Color;

pub const PRIMARY: Color = Color::TrueColor { r: 102, g: 217, b: 239 };
pub const ACCENT: Color = Color::TrueColor { r: 166, g: 226, b: 46 };
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::TrueColor { r: 220, g: 220, b: 220 };

pub const IPV4_ADDR: Color = Color::TrueColor { r: 120, g: 190, b: 255 };
pub const PORT: Color = Color::TrueColor { r: 174, g: 129, b: 255 };
pub const VENDOR: Color = Color::TrueColor { r: 253, g: 151, b: 31 };

pub const POWER_ON: Color = Color::Green;
pub const POWER_OFF: Color = Color::Red;
pub const UNKNOWN: Color = Color::Yellow;
