//! Stickers command - list the palette

use anyhow::Result;
use stickercam_core::overlay::PALETTE;

/// Print every sticker with its id and emoji
pub fn stickers() -> Result<()> {
    println!("Stickercam - Sticker Palette\n");

    println!("{:<12} {:<6} {}", "ID", "Emoji", "Name");
    println!("{}", "-".repeat(50));

    for sticker in &PALETTE {
        println!("{:<12} {:<6} {}", sticker.id, sticker.glyph, sticker.name);
    }

    println!("\nPlace one with: stickercam snap --sticker <id>@<x>,<y>");
    Ok(())
}
