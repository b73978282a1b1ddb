//! Edge detection for the key matrix.
//!
//! The scanner drives one column at a time and samples every row. [`KeyMatrix`] debounces each switch and reports
//! only the switches whose state changed.

use crate::key::KeyEvent;

/// Rows in the key matrix.
pub const MATRIX_ROWS: usize = 6;
/// Columns in the key matrix.
pub const MATRIX_COLS: usize = 10;
/// Switch positions in the key matrix; not all of them are populated.
pub const MATRIX_KEY_CNT: usize = MATRIX_ROWS * MATRIX_COLS;

/// Consecutive samples a switch must disagree with its settled state before the change is reported.
///
/// At the scanner's 1 ms period this rides out roughly 5 ms of contact bounce.
pub const DEBOUNCE_SAMPLES: u8 = 5;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Switch {
    closed: bool,
    disagreeing: u8,
}

/// Debounced state of every switch in a `ROWS` × `COLS` matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyMatrix<const ROWS: usize = MATRIX_ROWS, const COLS: usize = MATRIX_COLS> {
    switches: [[Switch; ROWS]; COLS],
    debounce_samples: u8,
}

impl Default for KeyMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl<const ROWS: usize, const COLS: usize> KeyMatrix<ROWS, COLS> {
    /// Constructs a `KeyMatrix` with every switch open, debouncing over [`DEBOUNCE_SAMPLES`].
    pub fn new() -> Self {
        Self::with_debounce(DEBOUNCE_SAMPLES)
    }

    /// Constructs a `KeyMatrix` with every switch open, reporting a change once `samples` consecutive samples agree
    /// on it. Zero is treated as one, i.e. no debouncing.
    pub fn with_debounce(samples: u8) -> Self {
        Self {
            switches: [[Switch::default(); ROWS]; COLS],
            debounce_samples: samples.max(1),
        }
    }

    /// Raw key identifier of the switch at `row`, `col`.
    pub fn key_id(row: usize, col: usize) -> u16 {
        (row * COLS + col + 1) as u16
    }

    /// Records a fresh sample of column `col` and calls `emit` once per switch whose settled state changed, top row
    /// first.
    pub fn update_column(&mut self, col: usize, rows: [bool; ROWS], mut emit: impl FnMut(KeyEvent)) {
        let debounce_samples = self.debounce_samples;
        let Some(column) = self.switches.get_mut(col) else {
            error!("Column {} is outside the key matrix", col);
            return;
        };

        for (row, (switch, now)) in column.iter_mut().zip(rows).enumerate() {
            if switch.closed == now {
                switch.disagreeing = 0;
                continue;
            }
            switch.disagreeing += 1;
            if switch.disagreeing < debounce_samples {
                continue;
            }
            switch.disagreeing = 0;
            switch.closed = now;

            let key = Self::key_id(row, col);
            emit(if now {
                KeyEvent::pressed(key)
            } else {
                KeyEvent::released(key)
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(matrix: &mut KeyMatrix, col: usize, rows: [bool; MATRIX_ROWS]) -> [Option<KeyEvent>; 4] {
        let mut events = [None; 4];
        let mut cnt = 0;
        matrix.update_column(col, rows, |event| {
            events[cnt] = Some(event);
            cnt += 1;
        });
        events
    }

    #[test]
    fn key_ids_are_one_based() {
        assert_eq!(1, KeyMatrix::<6, 10>::key_id(0, 0));
        assert_eq!(10, KeyMatrix::<6, 10>::key_id(0, 9));
        assert_eq!(11, KeyMatrix::<6, 10>::key_id(1, 0));
        assert_eq!(60, KeyMatrix::<6, 10>::key_id(5, 9));
    }

    fn undebounced() -> KeyMatrix {
        KeyMatrix::with_debounce(1)
    }

    #[test]
    fn reports_press_then_release() {
        let mut matrix = undebounced();

        let events = sample(&mut matrix, 2, [false, true, false, false, false, false]);
        assert_eq!([Some(KeyEvent::pressed(13)), None, None, None], events);

        let events = sample(&mut matrix, 2, [false, true, false, false, false, false]);
        assert_eq!([None; 4], events, "Unchanged switches should stay quiet");

        let events = sample(&mut matrix, 2, [false; MATRIX_ROWS]);
        assert_eq!([Some(KeyEvent::released(13)), None, None, None], events);
    }

    #[test]
    fn columns_are_independent() {
        let mut matrix = undebounced();
        sample(&mut matrix, 0, [true, false, false, false, false, true]);

        let events = sample(&mut matrix, 1, [true, false, false, false, false, false]);
        assert_eq!([Some(KeyEvent::pressed(2)), None, None, None], events);

        let events = sample(&mut matrix, 0, [false, false, false, false, false, true]);
        assert_eq!([Some(KeyEvent::released(1)), None, None, None], events);
    }

    #[test]
    fn several_rows_change_at_once() {
        let mut matrix = undebounced();
        let events = sample(&mut matrix, 4, [true, false, true, false, false, true]);
        assert_eq!(
            [
                Some(KeyEvent::pressed(5)),
                Some(KeyEvent::pressed(25)),
                Some(KeyEvent::pressed(55)),
                None
            ],
            events
        );
    }

    #[test]
    fn out_of_range_column_is_ignored() {
        let mut matrix = KeyMatrix::default();
        let events = sample(&mut matrix, MATRIX_COLS, [true; MATRIX_ROWS]);
        assert_eq!([None; 4], events);
        assert_eq!(KeyMatrix::default(), matrix);
    }

    #[test]
    fn bounce_is_suppressed() {
        let mut matrix = KeyMatrix::default();
        let closed = [true, false, false, false, false, false];
        let open = [false; MATRIX_ROWS];

        // contacts chatter while the key goes down
        for rows in [closed, open, closed, closed, open] {
            assert_eq!([None; 4], sample(&mut matrix, 3, rows), "Expected bounce to stay quiet");
        }
        for _ in 1..DEBOUNCE_SAMPLES {
            assert_eq!([None; 4], sample(&mut matrix, 3, closed));
        }
        assert_eq!(
            [Some(KeyEvent::pressed(4)), None, None, None],
            sample(&mut matrix, 3, closed)
        );

        // a single open sample while held is not a release
        assert_eq!([None; 4], sample(&mut matrix, 3, open));
        for _ in 1..DEBOUNCE_SAMPLES {
            assert_eq!([None; 4], sample(&mut matrix, 3, closed));
        }
    }

    #[test]
    fn release_reported_after_settling() {
        let mut matrix = KeyMatrix::default();
        let closed = [false, false, true, false, false, false];
        for _ in 0..DEBOUNCE_SAMPLES {
            sample(&mut matrix, 0, closed);
        }

        let open = [false; MATRIX_ROWS];
        for _ in 1..DEBOUNCE_SAMPLES {
            assert_eq!([None; 4], sample(&mut matrix, 0, open));
        }
        assert_eq!(
            [Some(KeyEvent::released(21)), None, None, None],
            sample(&mut matrix, 0, open)
        );
    }
}
