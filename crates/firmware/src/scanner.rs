//! Scans the key matrix and feeds transitions to the dispatcher.

use embassy_stm32::gpio::{Input, Output};
use embassy_time::{Duration, Timer};
use lkp_keyboard_lib::{
    matrix::{KeyMatrix, MATRIX_COLS, MATRIX_ROWS},
    queue::EventProducer,
};

/// Pause between complete passes over the matrix. [`KeyMatrix`] counts bounce in passes, so this sets its timescale.
const SCAN_PERIOD: Duration = Duration::from_millis(1);

/// Time for the rows to settle after a column is driven high.
const SETTLE_TIME: Duration = Duration::from_micros(5);

/// Task responsible for scanning the key matrix.
///
/// Columns are driven high one at a time and the rows, pulled low, read high wherever a switch in that column is
/// closed.
#[embassy_executor::task]
pub async fn scan_keys(
    mut columns: [Output<'static>; MATRIX_COLS],
    rows: [Input<'static>; MATRIX_ROWS],
    mut events: EventProducer<'static>,
) -> ! {
    let mut matrix = KeyMatrix::default();
    loop {
        for (col, column) in columns.iter_mut().enumerate() {
            column.set_high();
            Timer::after(SETTLE_TIME).await;
            let closed = rows.each_ref().map(|row| row.is_high());
            column.set_low();

            matrix.update_column(col, closed, |event| {
                events.push(event);
            });
        }
        Timer::after(SCAN_PERIOD).await;
    }
}
