use crate::bond::BondOrder;
use crate::element::Element;

pub trait HasElement {
    fn element(&self) -> Element;
}

pub trait HasAtomicNum {
    fn atomic_num(&self) -> u8;
}

impl<T: HasElement> HasAtomicNum for T {
    fn atomic_num(&self) -> u8 {
        self.element().atomic_num()
    }
}

pub trait HasFormalCharge {
    fn formal_charge(&self) -> i8;
}

pub trait HasPosition2D {
    fn position_2d(&self) -> [f64; 2];
    fn set_position_2d(&mut self, pos: [f64; 2]);

    /// Squared distance to `pos`. Merge tolerance checks compare against
    /// the squared tolerance.
    fn distance_sq(&self, pos: [f64; 2]) -> f64 {
        let [x, y] = self.position_2d();
        let (dx, dy) = (pos[0] - x, pos[1] - y);
        dx * dx + dy * dy
    }
}

pub trait HasBondOrder {
    fn bond_order(&self) -> BondOrder;
}
