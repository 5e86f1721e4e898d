//! Bring-up procedures for checking wiring on real hardware.

use std::time::Duration;

use tracing::{debug, info};
use valve_core::domain::layout::{TABLE_HEIGHT, TABLE_WIDTH};
use valve_core::{BoardChain, Coordinate};

use super::valve_worker::{ValveHandle, WorkerError};

/// Alternates one board between all-closed and all-open.
///
/// Each cycle clears the board, waits `delay`, fills it, waits `delay`.  The
/// board is left closed afterwards.
///
/// # Errors
///
/// Stops at the first failed command and returns its error.
pub async fn cycle_board(
    handle: &ValveHandle,
    index: usize,
    delay: Duration,
    cycles: u32,
) -> Result<(), WorkerError> {
    info!(index, cycles, "cycling board");
    for cycle in 0..cycles {
        debug!(index, cycle, "board closed");
        handle.set_board(index, false).await?;
        tokio::time::sleep(delay).await;

        debug!(index, cycle, "board open");
        handle.set_board(index, true).await?;
        tokio::time::sleep(delay).await;
    }
    handle.set_board(index, false).await
}

/// Every mapped cell of `chain`, row by row.
pub fn walk_order(chain: &BoardChain) -> Vec<Coordinate> {
    let mut cells: Vec<Coordinate> = chain.coordinates().collect();
    cells.sort_by_key(|c| (c.y, c.x));
    cells
}

/// Text map of the table showing which board drives each cell.
///
/// One line per row, top row first.  Each cell is the board's wiring index,
/// or `..` where no board is mounted.
pub fn layout_map(chain: &BoardChain) -> String {
    let mut out = String::new();
    for y in 0..TABLE_HEIGHT {
        let row: Vec<String> = (0..TABLE_WIDTH)
            .map(|x| match chain.board_index(Coordinate::new(x, y)) {
                Some(index) => format!("{index:>2}"),
                None => "..".to_string(),
            })
            .collect();
        out.push_str(&row.join(" "));
        out.push('\n');
    }
    out
}

/// Sets each cell in `cells` to `open`, one command per cell, waiting `delay`
/// after each.  Returns the number of cells driven.
///
/// # Errors
///
/// Stops at the first failed command and returns its error.
pub async fn walk(
    handle: &ValveHandle,
    cells: &[Coordinate],
    delay: Duration,
    open: bool,
) -> Result<usize, WorkerError> {
    info!(cells = cells.len(), open, "walking table");
    for (step, &cell) in cells.iter().enumerate() {
        debug!(step, %cell, "walk step");
        handle.set(cell, open).await?;
        tokio::time::sleep(delay).await;
    }
    Ok(cells.len())
}
