use ratatui::layout::Rect;
use waterquest::{PlayArea, Target};

/// Play-area units per terminal cell. Cells are roughly twice as tall as wide.
pub const CELL_WIDTH: f64 = 8.0;
pub const CELL_HEIGHT: f64 = 16.0;
pub const HUD_HEIGHT: u16 = 3;

/// Split the screen into the HUD strip and the bordered playfield
pub fn split(area: Rect) -> (Rect, Rect) {
    let hud_height = HUD_HEIGHT.min(area.height);
    let hud = Rect::new(area.x, area.y, area.width, hud_height);
    let field = Rect::new(
        area.x,
        area.y + hud_height,
        area.width,
        area.height - hud_height,
    );
    (hud, field)
}

/// Playfield without its border; this is where targets live
pub fn field_inner(area: Rect) -> Rect {
    let (_, field) = split(area);
    Rect::new(
        field.x.saturating_add(1),
        field.y.saturating_add(1),
        field.width.saturating_sub(2),
        field.height.saturating_sub(2),
    )
}

pub fn play_area(inner: Rect) -> PlayArea {
    PlayArea::new(
        f64::from(inner.width) * CELL_WIDTH,
        f64::from(inner.height) * CELL_HEIGHT,
    )
}

/// Centre of the clicked cell in play-area units, if it is inside the field
pub fn cell_to_point(inner: Rect, col: u16, row: u16) -> Option<(f64, f64)> {
    let inside = col >= inner.x
        && col < inner.x + inner.width
        && row >= inner.y
        && row < inner.y + inner.height;
    if !inside {
        return None;
    }
    Some((
        f64::from(col - inner.x) * CELL_WIDTH + CELL_WIDTH / 2.0,
        f64::from(row - inner.y) * CELL_HEIGHT + CELL_HEIGHT / 2.0,
    ))
}

/// Cells whose centre falls inside the target's hit-area, clipped to the field.
/// Clicking any drawn cell therefore always lands on the target.
pub fn target_rect(inner: Rect, target: &Target) -> Rect {
    let size = f64::from(target.size);
    let (c0, c1) = covered_cells(target.position.x, size, CELL_WIDTH);
    let (r0, r1) = covered_cells(target.position.y, size, CELL_HEIGHT);

    let rect = Rect::new(
        inner.x.saturating_add(c0),
        inner.y.saturating_add(r0),
        c1.saturating_sub(c0),
        r1.saturating_sub(r0),
    );
    rect.intersection(inner)
}

fn covered_cells(start: f64, size: f64, cell: f64) -> (u16, u16) {
    let half = cell / 2.0;
    let first = ((start - half) / cell).ceil().max(0.0);
    let end = ((start + size - half) / cell).ceil().max(first);
    (first as u16, end as u16)
}

/// Cell where a play-area point is drawn
pub fn point_to_cell(inner: Rect, x: f64, y: f64) -> (u16, u16) {
    let col = (x / CELL_WIDTH).floor().max(0.0) as u16;
    let row = (y / CELL_HEIGHT).floor().max(0.0) as u16;
    (
        inner.x.saturating_add(col).min(inner.right().saturating_sub(1)),
        inner.y.saturating_add(row).min(inner.bottom().saturating_sub(1)),
    )
}
