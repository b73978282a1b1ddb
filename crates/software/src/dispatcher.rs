//! Routes key events to the keyboard state and expresses the result on the outputs.
//!
//! Keybed keys become MIDI notes and, under last-key priority, the control voltage and gate. The octave keys and the
//! function key only change how later keybed events are translated; they never touch a note that is already sounding.

use crate::{
    Error,
    configuration::DuplicatePress,
    io::{ControlVoltage, InfallibleOutput, MidiTransport},
    key::{KeyAction, KeyEvent, KeyId, KeyKind, PackedKeyEvent},
    keyboard_state::{KeyboardState, OCTAVE_INDICATOR_CNT, OctaveShift},
    midi::{self, MIDI_CABLE},
    pitch,
    queue::EventConsumer,
};

/// Owns the keyboard state and every output it drives.
///
/// Exactly one `Dispatcher` exists; it lives in the dispatch task for the lifetime of the firmware.
pub struct Dispatcher<CV, G, L, M> {
    state: KeyboardState,
    cv: CV,
    gate: G,
    octave_leds: [L; OCTAVE_INDICATOR_CNT],
    midi: M,
}

impl<CV, G, L, M> Dispatcher<CV, G, L, M>
where
    CV: ControlVoltage,
    G: InfallibleOutput,
    L: InfallibleOutput,
    M: MidiTransport,
{
    /// Constructs a `Dispatcher`, silencing the gate and showing the initial octave on the indicators.
    pub fn new(
        duplicate_press: DuplicatePress,
        cv: CV,
        gate: G,
        octave_leds: [L; OCTAVE_INDICATOR_CNT],
        midi: M,
    ) -> Self {
        let mut dispatcher = Self {
            state: KeyboardState::new(duplicate_press),
            cv,
            gate,
            octave_leds,
            midi,
        };
        dispatcher.gate.set_level(false);
        dispatcher.render_octave_indicators();
        dispatcher
    }

    /// Getter.
    pub fn state(&self) -> &KeyboardState {
        &self.state
    }

    /// Processes events forever, waiting whenever the queue runs dry.
    pub async fn run<const N: usize>(&mut self, events: &mut EventConsumer<'_, N>) -> ! {
        loop {
            let packed = events.pop().await;
            self.dispatch_packed(packed);
            self.drain(events);
        }
    }

    /// Processes every event already waiting in the queue without waiting for more. Returns the number processed.
    pub fn drain<const N: usize>(&mut self, events: &mut EventConsumer<'_, N>) -> usize {
        let mut cnt = 0;
        while let Some(packed) = events.try_pop() {
            self.dispatch_packed(packed);
            cnt += 1;
        }
        cnt
    }

    /// Unpacks and processes an event taken from the queue. Malformed events are logged and discarded.
    pub fn dispatch_packed(&mut self, packed: PackedKeyEvent) {
        match packed.unpack() {
            Ok(event) => self.dispatch(event),
            Err(e) => error!("Discarding key event {}: {}", packed.raw(), e),
        }
    }

    /// Processes a single event. Events for invalid keys are logged and discarded.
    pub fn dispatch(&mut self, event: KeyEvent) {
        if let Err(e) = self.try_dispatch(event) {
            error!("Discarding key event: {}", e);
        }
    }

    /// Processes a single event, failing without side effects if the key is invalid.
    pub fn try_dispatch(&mut self, event: KeyEvent) -> Result<(), Error> {
        let key = KeyId::new(event.key)?;
        debug!("Key event: {}", event);

        match key.kind() {
            KeyKind::Keybed => self.handle_keybed(event.action, key),
            KeyKind::Function => {
                self.state
                    .octave
                    .set_func_held(event.action == KeyAction::Pressed);
            }
            KeyKind::Octave(shift) => self.handle_octave(event.action, shift),
        }
        Ok(())
    }

    fn handle_keybed(&mut self, action: KeyAction, key: KeyId) {
        // the note is sent before the state changes so it reflects the octave offsets in effect when the key moved
        self.send_note(action, key);

        match action {
            KeyAction::Pressed => {
                self.state.held_keys.push(key);
                // low already if nothing was sounding; otherwise this retriggers the envelope
                self.gate.set_level(false);
            }
            KeyAction::Released => {
                if !self.state.held_keys.pop(key) {
                    // a key other than the sounding one was released
                    return;
                }
                // either silences the voice or retriggers it for the next most recent key
                self.gate.set_level(false);
            }
        }

        self.play_last_note();
    }

    fn handle_octave(&mut self, action: KeyAction, shift: OctaveShift) {
        if action == KeyAction::Released {
            return;
        }

        self.state.octave.shift(shift);
        info!(
            "Octave offsets: top {}, bottom {}",
            self.state.octave.top_offset(),
            self.state.octave.bottom_offset()
        );
        self.render_octave_indicators();
    }

    /// Raises the gate and sets the control voltage for the most recent held key, if any.
    fn play_last_note(&mut self) {
        let Some(voltage) = self.state.voice() else {
            debug!("No keys held");
            return;
        };

        self.gate.set_level(true);
        info!("Setting CV to {}V", voltage.as_volts());
        self.cv.set_voltage(voltage);
    }

    fn send_note(&mut self, action: KeyAction, key: KeyId) {
        let number = pitch::key_to_midi(key, &self.state.octave);
        let Some(note) = midi::note_from_number(number) else {
            error!(
                "Key {} translates to MIDI note {}, which is out of range",
                key.get(),
                number
            );
            return;
        };

        let message = midi::note_message(action, note);
        if let Some(bytes) = midi::message_bytes(&message) {
            debug!("MIDI note - status: {=u8:#x}, note: {}", bytes[0], bytes[1]);
            self.midi.send_message(MIDI_CABLE, bytes);
        }
    }

    fn render_octave_indicators(&mut self) {
        let lit = self.state.octave.indicators();
        for (led, on) in self.octave_leds.iter_mut().zip(lit) {
            led.set_level(on);
        }
    }
}
