use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::{snapshot::SnapshotConfig, ui};

/// Render a snapshot into a plain-text screen of the given size
pub async fn render_snapshot(snapshot: SnapshotConfig, width: u16, height: u16) -> Result<String> {
    let app = snapshot.into_app().await?;

    let backend = TestBackend::new(width, height);
    let mut terminal = Terminal::new(backend)?;
    terminal.draw(|frame| {
        ui::draw(frame, &app);
    })?;

    Ok(buffer_to_string(terminal.backend().buffer()))
}

pub async fn generate_screenshot(
    config_path: &Path,
    output_path: Option<&Path>,
    width: u16,
    height: u16,
) -> Result<()> {
    let snapshot = SnapshotConfig::load_from_file(config_path)?;
    let screenshot = render_snapshot(snapshot, width, height).await?;

    match output_path {
        Some(path) => {
            fs::write(path, screenshot)?;
            println!("Screenshot saved to: {}", path.display());
        }
        None => {
            print!("{}", screenshot);
        }
    }

    Ok(())
}

pub fn buffer_to_string(buffer: &Buffer) -> String {
    let mut result = String::new();

    for y in 0..buffer.area().height {
        for x in 0..buffer.area().width {
            let sym = buffer[(x, y)].symbol();

            // Use a space for empty cells to make output more readable
            if sym.is_empty() {
                result.push(' ');
            } else {
                result.push_str(sym);
            }
        }
        result.push('\n');
    }

    result
}
