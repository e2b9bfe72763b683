//! Serial line parameters.

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

/// Number of stop bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopBits {
    One,
    Two,
}

/// Parity checking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parity {
    None,
    Odd,
    Even,
}

/// Line parameters applied to a serial transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineSettings {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
}

impl LineSettings {
    /// DMX512 line discipline: 250 kbaud, 8 data bits, no parity, 2 stop bits.
    pub const DMX512: LineSettings = LineSettings {
        baud_rate: 250_000,
        data_bits: DataBits::Eight,
        stop_bits: StopBits::Two,
        parity: Parity::None,
    };

    /// Short "8N2"-style description of the framing.
    pub fn framing(&self) -> String {
        let bits = match self.data_bits {
            DataBits::Five => '5',
            DataBits::Six => '6',
            DataBits::Seven => '7',
            DataBits::Eight => '8',
        };
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Odd => 'O',
            Parity::Even => 'E',
        };
        let stop = match self.stop_bits {
            StopBits::One => '1',
            StopBits::Two => '2',
        };
        format!("{bits}{parity}{stop}")
    }
}

impl std::fmt::Display for LineSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} baud {}", self.baud_rate, self.framing())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dmx512_is_250k_8n2() {
        assert_eq!(LineSettings::DMX512.baud_rate, 250_000);
        assert_eq!(LineSettings::DMX512.framing(), "8N2");
        assert_eq!(LineSettings::DMX512.to_string(), "250000 baud 8N2");
    }

    #[test]
    fn framing_reflects_each_field() {
        let settings = LineSettings {
            baud_rate: 9600,
            data_bits: DataBits::Seven,
            stop_bits: StopBits::One,
            parity: Parity::Even,
        };
        assert_eq!(settings.framing(), "7E1");
    }
}
