//! VGA DAC palettes.
//!
//! A palette holds 256 registers of 6-bit RGB ("DAC values", 0..=63). Text
//! mode only addresses 16 of them, through the EGA attribute-controller map
//! in [`EGA_MAP`].
//!
//! Raw palette files are a sequence of `r g b` byte triples, up to 256 of
//! them. Loading replaces registers from 0 upward and leaves the rest alone.

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

/// Number of DAC registers.
pub const PALETTE_REGS: usize = 256;

/// Largest DAC component value.
pub const DAC_MAX: u8 = 63;

/// Size in bytes of the registers touched by the EGA default palette.
pub const DEFAULT_PALETTE_BYTES: usize = 192;

/// Attribute color number to DAC register.
pub const EGA_MAP: [u8; 16] = [0, 1, 2, 3, 4, 5, 20, 7, 56, 57, 58, 59, 60, 61, 62, 63];

/// One DAC register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Build a register value, clamping each component to [`DAC_MAX`].
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: clamp_dac(r),
            g: clamp_dac(g),
            b: clamp_dac(b),
        }
    }

    /// Scale to 8 bits per component for display.
    #[must_use]
    pub const fn to_rgb8(self) -> (u8, u8, u8) {
        (scale8(self.r), scale8(self.g), scale8(self.b))
    }

    fn step_toward(self, target: Self) -> Self {
        Self {
            r: step_component(self.r, target.r),
            g: step_component(self.g, target.g),
            b: step_component(self.b, target.b),
        }
    }
}

const fn clamp_dac(v: u8) -> u8 {
    if v > DAC_MAX { DAC_MAX } else { v }
}

const fn scale8(v: u8) -> u8 {
    (v << 2) | (v >> 4)
}

fn step_component(from: u8, to: u8) -> u8 {
    if from > to {
        from.saturating_sub(1).max(to)
    } else {
        from.saturating_add(1).min(to)
    }
}

/// Errors from palette loading.
#[derive(Debug)]
pub enum PaletteError {
    /// Data length is not a multiple of three.
    Misaligned { len: usize },
    /// Data holds more than [`PALETTE_REGS`] triples.
    TooLarge { len: usize },
    /// The palette file could not be read.
    Io(std::io::Error),
}

impl fmt::Display for PaletteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Misaligned { len } => {
                write!(f, "palette data length {len} is not a multiple of 3")
            }
            Self::TooLarge { len } => write!(
                f,
                "palette data length {len} exceeds {} bytes",
                PALETTE_REGS * 3
            ),
            Self::Io(err) => write!(f, "cannot read palette file: {err}"),
        }
    }
}

impl std::error::Error for PaletteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PaletteError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Built-in palettes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StockPalette {
    /// The standard 16-color EGA palette.
    Default,
    /// Every register at full intensity.
    White,
    /// Every register black.
    Black,
    /// The default palette averaged to grey.
    Greyscale,
}

struct StockRegistry {
    default: Palette,
    white: Palette,
    black: Palette,
    greyscale: Palette,
}

static STOCK: LazyLock<StockRegistry> = LazyLock::new(|| {
    let default = Palette::ega();
    let mut greyscale = default.clone();
    for reg in &mut greyscale.regs {
        let avg = ((u16::from(reg.r) + u16::from(reg.g) + u16::from(reg.b)) / 3) as u8;
        *reg = Rgb::new(avg, avg, avg);
    }
    StockRegistry {
        default,
        white: Palette::filled(Rgb::new(DAC_MAX, DAC_MAX, DAC_MAX)),
        black: Palette::filled(Rgb::default()),
        greyscale,
    }
});

impl StockPalette {
    /// Shared read-only instance of this palette.
    #[must_use]
    pub fn get(self) -> &'static Palette {
        let stock = &*STOCK;
        match self {
            Self::Default => &stock.default,
            Self::White => &stock.white,
            Self::Black => &stock.black,
            Self::Greyscale => &stock.greyscale,
        }
    }
}

/// A full set of DAC registers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    regs: [Rgb; PALETTE_REGS],
}

impl Default for Palette {
    fn default() -> Self {
        StockPalette::Default.get().clone()
    }
}

impl Palette {
    fn filled(value: Rgb) -> Self {
        Self {
            regs: [value; PALETTE_REGS],
        }
    }

    /// Build the EGA default: registers 0..64 encode `rgbRGB` bit patterns,
    /// uppercase bits worth 0x2a and lowercase bits worth 0x15.
    fn ega() -> Self {
        let mut pal = Self::filled(Rgb::default());
        for (i, reg) in pal.regs.iter_mut().take(64).enumerate() {
            let level = |hi: usize, lo: usize| -> u8 {
                let mut v = 0;
                if i & (1 << hi) != 0 {
                    v += 0x2a;
                }
                if i & (1 << lo) != 0 {
                    v += 0x15;
                }
                v
            };
            *reg = Rgb::new(level(2, 5), level(1, 4), level(0, 3));
        }
        pal
    }

    /// Replace registers from 0 upward with raw `r g b` triples.
    ///
    /// Components above 63 are clamped. On error the palette is unchanged.
    pub fn load(&mut self, data: &[u8]) -> Result<(), PaletteError> {
        if data.len() % 3 != 0 {
            return Err(PaletteError::Misaligned { len: data.len() });
        }
        if data.len() > PALETTE_REGS * 3 {
            return Err(PaletteError::TooLarge { len: data.len() });
        }
        for (reg, rgb) in self.regs.iter_mut().zip(data.chunks_exact(3)) {
            *reg = Rgb::new(rgb[0], rgb[1], rgb[2]);
        }
        Ok(())
    }

    /// Build a palette from a raw palette file.
    ///
    /// Registers the file does not cover keep their default values.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PaletteError> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let mut pal = Self::default();
        if let Err(err) = pal.load(&data) {
            tracing::warn!(path = %path.display(), %err, "rejected palette file");
            return Err(err);
        }
        Ok(pal)
    }

    /// Set one register; components are clamped.
    pub fn set_reg(&mut self, reg: u8, r: u8, g: u8, b: u8) {
        self.regs[usize::from(reg)] = Rgb::new(r, g, b);
    }

    /// Read one register.
    #[inline]
    #[must_use]
    pub fn reg(&self, reg: u8) -> Rgb {
        self.regs[usize::from(reg)]
    }

    /// Color for a text attribute color number (0..=15, masked).
    #[inline]
    #[must_use]
    pub fn color(&self, index: u8) -> Rgb {
        self.regs[usize::from(EGA_MAP[usize::from(index & 0x0F)])]
    }

    /// Move every component one DAC unit toward `target`.
    pub fn morph_step(&mut self, target: &Palette) {
        for (reg, goal) in self.regs.iter_mut().zip(target.regs.iter()) {
            *reg = reg.step_toward(*goal);
        }
    }
}
