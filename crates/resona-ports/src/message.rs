use crate::midi::MidiError;

/// A channel voice message decoded from raw bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelMessage {
    NoteOff { channel: u8, note: u8, velocity: u8 },
    NoteOn { channel: u8, note: u8, velocity: u8 },
    PolyPressure { channel: u8, note: u8, pressure: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    ChannelPressure { channel: u8, pressure: u8 },
    /// 14-bit value, 0x2000 is centre.
    PitchBend { channel: u8, value: u16 },
}

/// Total length in bytes of a message starting with `status`, or `None`
/// for variable-length (SysEx) and undefined statuses.
pub fn message_length(status: u8) -> Option<usize> {
    match status {
        0x80..=0xBF | 0xE0..=0xEF => Some(3),
        0xC0..=0xDF => Some(2),
        0xF1 | 0xF3 => Some(2),
        0xF2 => Some(3),
        0xF6 | 0xF8 | 0xFA | 0xFB | 0xFC | 0xFE | 0xFF => Some(1),
        _ => None,
    }
}

/// Checks status and length of a raw message. SysEx (`F0 .. F7`) is
/// accepted when properly terminated.
pub fn validate(message: &[u8]) -> Result<(), MidiError> {
    let Some(&status) = message.first() else {
        return Err(MidiError::InvalidMessage("empty message".to_string()));
    };
    if status < 0x80 {
        return Err(MidiError::InvalidMessage(format!("missing status byte: {status:#04x}")));
    }
    if status == 0xF0 {
        return match message.last() {
            Some(0xF7) if message.len() >= 2 => Ok(()),
            _ => Err(MidiError::InvalidMessage("unterminated sysex".to_string())),
        };
    }
    let expected = message_length(status)
        .ok_or_else(|| MidiError::InvalidMessage(format!("undefined status {status:#04x}")))?;
    if message.len() != expected {
        return Err(MidiError::InvalidMessage(format!(
            "status {status:#04x} takes {expected} bytes, got {}",
            message.len()
        )));
    }
    if message[1..].iter().any(|b| *b >= 0x80) {
        return Err(MidiError::InvalidMessage("data byte out of range".to_string()));
    }
    Ok(())
}

impl ChannelMessage {
    /// `Ok(None)` for valid non-channel messages (system, SysEx).
    pub fn parse(message: &[u8]) -> Result<Option<Self>, MidiError> {
        validate(message)?;
        let status = message[0];
        let channel = status & 0x0F;
        let message = match (status & 0xF0, &message[1..]) {
            (0x80, [note, velocity]) => ChannelMessage::NoteOff {
                channel,
                note: *note,
                velocity: *velocity,
            },
            (0x90, [note, velocity]) => ChannelMessage::NoteOn {
                channel,
                note: *note,
                velocity: *velocity,
            },
            (0xA0, [note, pressure]) => ChannelMessage::PolyPressure {
                channel,
                note: *note,
                pressure: *pressure,
            },
            (0xB0, [controller, value]) => ChannelMessage::ControlChange {
                channel,
                controller: *controller,
                value: *value,
            },
            (0xC0, [program]) => ChannelMessage::ProgramChange {
                channel,
                program: *program,
            },
            (0xD0, [pressure]) => ChannelMessage::ChannelPressure {
                channel,
                pressure: *pressure,
            },
            (0xE0, [lsb, msb]) => ChannelMessage::PitchBend {
                channel,
                value: ((*msb as u16) << 7) | *lsb as u16,
            },
            _ => return Ok(None),
        };
        Ok(Some(message))
    }

    pub fn channel(&self) -> u8 {
        match *self {
            ChannelMessage::NoteOff { channel, .. }
            | ChannelMessage::NoteOn { channel, .. }
            | ChannelMessage::PolyPressure { channel, .. }
            | ChannelMessage::ControlChange { channel, .. }
            | ChannelMessage::ProgramChange { channel, .. }
            | ChannelMessage::ChannelPressure { channel, .. }
            | ChannelMessage::PitchBend { channel, .. } => channel,
        }
    }
}
