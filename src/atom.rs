use crate::element::Element;

/// A drawn atom: an element, its formal charge and where it sits on the
/// canvas.
///
/// `Atom` stores only what the user placed. Hydrogen counts and bonded
/// valence are derived from the molecule graph by [`crate::valence`].
///
/// # Examples
///
/// ```
/// use molsketch::{Atom, Element};
///
/// let oxygen = Atom::new(Element::O).with_charge(-1).at(40.0, 12.0);
/// assert_eq!(oxygen.element, Element::O);
/// assert_eq!(oxygen.charge, -1);
/// assert_eq!(oxygen.position, [40.0, 12.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub element: Element,
    /// Formal charge in elementary charge units.
    pub charge: i8,
    /// Canvas coordinates. Only merge/unify and the rendering layer look
    /// at these.
    pub position: [f64; 2],
}

impl Atom {
    pub fn new(element: Element) -> Self {
        Self {
            element,
            charge: 0,
            position: [0.0, 0.0],
        }
    }

    pub fn with_charge(mut self, charge: i8) -> Self {
        self.charge = charge;
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = [x, y];
        self
    }

    pub fn set_charge(&mut self, charge: i8) {
        self.charge = charge;
    }
}

impl Default for Atom {
    fn default() -> Self {
        Self::new(Element::C)
    }
}

impl crate::traits::HasElement for Atom {
    fn element(&self) -> Element {
        self.element
    }
}

impl crate::traits::HasFormalCharge for Atom {
    fn formal_charge(&self) -> i8 {
        self.charge
    }
}

impl crate::traits::HasPosition2D for Atom {
    fn position_2d(&self) -> [f64; 2] {
        self.position
    }

    fn set_position_2d(&mut self, pos: [f64; 2]) {
        self.position = pos;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_neutral_carbon_at_origin() {
        let atom = Atom::default();
        assert_eq!(atom.element, Element::C);
        assert_eq!(atom.charge, 0);
        assert_eq!(atom.position, [0.0, 0.0]);
    }

    #[test]
    fn distance_sq() {
        use crate::traits::HasPosition2D;

        let atom = Atom::new(Element::N).at(1.0, 2.0);
        assert_eq!(atom.distance_sq([4.0, 6.0]), 25.0);
    }
}
