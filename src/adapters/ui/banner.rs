//! Welcome banner: "IASO MED" in figlet ASCII with a teal-to-blue gradient.

use crossterm::ExecutableCommand;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use figlet_rs::FIGfont;
use std::io::{Write, stdout};

/// Medical teal (#14b8a6).
pub(crate) const TEAL: (u8, u8, u8) = (0x14, 0xb8, 0xa6);
/// Clinical blue (#3b82f6).
pub(crate) const BLUE: (u8, u8, u8) = (0x3b, 0x82, 0xf6);

/// Linear interpolation between two RGB colors. `t` in [0.0, 1.0].
fn lerp_rgb(a: (u8, u8, u8), b: (u8, u8, u8), t: f64) -> (u8, u8, u8) {
    let mix = |x: u8, y: u8| (f64::from(x) * (1.0 - t) + f64::from(y) * t).round() as u8;
    (mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb { r, g, b }
}

/// Prints "IASO MED" with a vertical gradient, then version and AI mode.
/// Falls back to a plain title when the font cannot render.
pub fn print_welcome(ai_mode: &str) {
    let mut out = stdout();
    let font = FIGfont::standard().ok();
    let art = font
        .as_ref()
        .and_then(|font| font.convert("IASO MED"))
        .map(|figure| figure.to_string())
        .unwrap_or_else(|| "IASO MED\n".to_string());
    let lines: Vec<&str> = art.lines().collect();
    let total = lines.len().max(1);

    for (i, line) in lines.iter().enumerate() {
        let t = if total <= 1 {
            1.0
        } else {
            i as f64 / (total - 1) as f64
        };
        let _ = out.execute(SetForegroundColor(rgb(lerp_rgb(TEAL, BLUE, t))));
        let _ = out.execute(Print(line));
        let _ = out.execute(Print("\r\n"));
        let _ = out.execute(ResetColor);
    }

    let _ = out.execute(SetForegroundColor(rgb(TEAL)));
    let _ = out.execute(Print(format!(
        "v{}  ·  AI: {}\r\n",
        env!("CARGO_PKG_VERSION"),
        ai_mode
    )));
    let _ = out.execute(Print(
        "AI output is informational and not a medical diagnosis.\r\n\r\n",
    ));
    let _ = out.execute(ResetColor);
    let _ = out.flush();
}
