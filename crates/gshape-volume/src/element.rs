//! Chemical element definitions
//!
//! Covers the elements found in drug-like small molecules. Each element
//! carries the VdW radius that sizes its atom Gaussian.

use std::fmt;

/// Chemical element with the properties needed for shape Gaussians
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Element {
    /// Unrecognized element; gets a carbon-like radius
    #[default]
    Unknown = 0,
    Hydrogen = 1,
    Boron = 5,
    Carbon = 6,
    Nitrogen = 7,
    Oxygen = 8,
    Fluorine = 9,
    Silicon = 14,
    Phosphorus = 15,
    Sulfur = 16,
    Chlorine = 17,
    Selenium = 34,
    Bromine = 35,
    Iodine = 53,
}

/// Element data table entry
struct ElementData {
    element: Element,
    symbol: &'static str,
    vdw: f64,
    mass: f64,
}

/// Radii and masses as tabulated in PyMOL's element table
static ELEMENT_DATA: &[ElementData] = &[
    ElementData { element: Element::Unknown, symbol: "X", vdw: 1.70, mass: 0.0 },
    ElementData { element: Element::Hydrogen, symbol: "H", vdw: 1.20, mass: 1.00794 },
    ElementData { element: Element::Boron, symbol: "B", vdw: 1.85, mass: 10.811 },
    ElementData { element: Element::Carbon, symbol: "C", vdw: 1.70, mass: 12.0107 },
    ElementData { element: Element::Nitrogen, symbol: "N", vdw: 1.55, mass: 14.0067 },
    ElementData { element: Element::Oxygen, symbol: "O", vdw: 1.52, mass: 15.9994 },
    ElementData { element: Element::Fluorine, symbol: "F", vdw: 1.47, mass: 18.9984032 },
    ElementData { element: Element::Silicon, symbol: "Si", vdw: 2.10, mass: 28.0855 },
    ElementData { element: Element::Phosphorus, symbol: "P", vdw: 1.80, mass: 30.973762 },
    ElementData { element: Element::Sulfur, symbol: "S", vdw: 1.80, mass: 32.065 },
    ElementData { element: Element::Chlorine, symbol: "Cl", vdw: 1.75, mass: 35.453 },
    ElementData { element: Element::Selenium, symbol: "Se", vdw: 1.90, mass: 78.96 },
    ElementData { element: Element::Bromine, symbol: "Br", vdw: 1.85, mass: 79.904 },
    ElementData { element: Element::Iodine, symbol: "I", vdw: 1.98, mass: 126.90447 },
];

impl Element {
    fn data(&self) -> &'static ElementData {
        ELEMENT_DATA
            .iter()
            .find(|d| d.element == *self)
            .unwrap_or(&ELEMENT_DATA[0])
    }

    /// Parse an element symbol (case-insensitive)
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let symbol = symbol.trim();
        ELEMENT_DATA
            .iter()
            .skip(1)
            .find(|d| d.symbol.eq_ignore_ascii_case(symbol))
            .map(|d| d.element)
    }

    /// Look up an element by atomic number
    pub fn from_atomic_number(n: u8) -> Option<Self> {
        ELEMENT_DATA
            .iter()
            .skip(1)
            .find(|d| d.element as u8 == n)
            .map(|d| d.element)
    }

    /// Element symbol
    pub fn symbol(&self) -> &'static str {
        self.data().symbol
    }

    /// Van der Waals radius in Å
    pub fn vdw_radius(&self) -> f64 {
        self.data().vdw
    }

    /// Atomic mass in Da
    pub fn mass(&self) -> f64 {
        self.data().mass
    }

    #[inline]
    pub fn is_hydrogen(&self) -> bool {
        *self == Element::Hydrogen
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
