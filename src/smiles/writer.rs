use std::collections::BTreeMap;

use petgraph::graph::NodeIndex;
use petgraph::visit::NodeIndexable;

use crate::bond::BondOrder;
use crate::canonical::Ranking;
use crate::mol::Mol;
use crate::traits::{HasBondOrder, HasElement, HasFormalCharge};

/// Writes one string per connected component, rooting each component at
/// its lowest-ranked atom. `ranking` must cover the atoms of `mol`.
pub fn write_ranked<A, B>(mol: &Mol<A, B>, ranking: &Ranking) -> Vec<String>
where
    A: HasElement + HasFormalCharge,
    B: HasBondOrder,
{
    let mut tree = SpanningForest::new(mol, ranking);
    let roots: Vec<NodeIndex> = ranking
        .order()
        .iter()
        .copied()
        .chain(mol.atoms())
        .filter(|&idx| mol.contains_atom(idx))
        .collect();

    let mut out = Vec::new();
    for root in roots {
        if tree.visited[root.index()] {
            continue;
        }
        tree.span(mol, root);
        let mut emitter = Emitter {
            tree: &tree,
            ring_numbers: BTreeMap::new(),
            next_ring: 1,
        };
        out.push(emitter.write_component(mol, root));
    }
    out
}

struct RingClosure {
    other: NodeIndex,
    order: BondOrder,
}

/// DFS tree over the molecule plus the bonds it did not follow.
/// Vectors are indexed by `NodeIndex::index()`.
struct SpanningForest {
    ranks: Vec<usize>,
    visited: Vec<bool>,
    /// Tree children in ascending rank; the last one is the backbone.
    children: Vec<Vec<(NodeIndex, BondOrder)>>,
    closures: Vec<Vec<RingClosure>>,
}

impl SpanningForest {
    fn new<A, B>(mol: &Mol<A, B>, ranking: &Ranking) -> Self {
        let bound = mol.graph().node_bound();
        let mut ranks = vec![usize::MAX; bound];
        for idx in mol.atoms() {
            if let Some(r) = ranking.rank(idx) {
                ranks[idx.index()] = r;
            }
        }
        Self {
            ranks,
            visited: vec![false; bound],
            children: (0..bound).map(|_| Vec::new()).collect(),
            closures: (0..bound).map(|_| Vec::new()).collect(),
        }
    }

    fn rank(&self, idx: NodeIndex) -> usize {
        self.ranks[idx.index()]
    }

    /// Neighbours of `node` except `parent`, highest rank first and the
    /// rest ascending, each with the order of the connecting bond.
    fn visit_order<A, B: HasBondOrder>(
        &self,
        mol: &Mol<A, B>,
        node: NodeIndex,
        parent: Option<NodeIndex>,
    ) -> Vec<(NodeIndex, BondOrder)> {
        let mut nbs: Vec<(NodeIndex, BondOrder)> = mol
            .bonds_of(node)
            .filter_map(|e| {
                let other = mol.other_end(e, node)?;
                (Some(other) != parent).then(|| (other, mol.bond(e).bond_order()))
            })
            .collect();
        nbs.sort_by_key(|&(nb, _)| (self.rank(nb), nb.index()));
        if let Some(backbone) = nbs.pop() {
            nbs.insert(0, backbone);
        }
        nbs
    }

    fn has_closure(&self, a: NodeIndex, b: NodeIndex) -> bool {
        self.closures[a.index()].iter().any(|rc| rc.other == b)
    }

    fn span<A, B: HasBondOrder>(&mut self, mol: &Mol<A, B>, root: NodeIndex) {
        self.visited[root.index()] = true;
        let mut component = vec![root];
        let mut stack: Vec<(NodeIndex, Vec<(NodeIndex, BondOrder)>, usize)> =
            vec![(root, self.visit_order(mol, root, None), 0)];

        while let Some((node, pending, next)) = stack.last_mut() {
            let node = *node;
            let Some(&(nb, order)) = pending.get(*next) else {
                stack.pop();
                continue;
            };
            *next += 1;

            if !self.visited[nb.index()] {
                self.visited[nb.index()] = true;
                component.push(nb);
                self.children[node.index()].push((nb, order));
                let order_from_nb = self.visit_order(mol, nb, Some(node));
                stack.push((nb, order_from_nb, 0));
            } else if !self.has_closure(node, nb) {
                self.closures[node.index()].push(RingClosure { other: nb, order });
                self.closures[nb.index()].push(RingClosure { other: node, order });
            }
        }

        for node in component {
            let ranks = &self.ranks;
            self.children[node.index()].sort_by_key(|&(c, _)| (ranks[c.index()], c.index()));
            self.closures[node.index()]
                .sort_by_key(|rc| (ranks[rc.other.index()], rc.other.index()));
        }
    }
}

struct Emitter<'a> {
    tree: &'a SpanningForest,
    /// Ring number per closure, keyed by the endpoint pair
    /// `(min index, max index)`.
    ring_numbers: BTreeMap<(usize, usize), usize>,
    next_ring: usize,
}

enum Step {
    /// Bond symbol, then the atom and everything below it.
    Enter(NodeIndex, BondOrder),
    Open,
    Close,
}

impl Emitter<'_> {
    fn write_component<A, B>(&mut self, mol: &Mol<A, B>, root: NodeIndex) -> String
    where
        A: HasElement + HasFormalCharge,
    {
        let tree = self.tree;
        let mut out = String::new();
        let mut steps = vec![Step::Enter(root, BondOrder::Single)];
        while let Some(step) = steps.pop() {
            let (node, order) = match step {
                Step::Open => {
                    out.push('(');
                    continue;
                }
                Step::Close => {
                    out.push(')');
                    continue;
                }
                Step::Enter(node, order) => (node, order),
            };
            out.push_str(order.symbol());
            write_label(mol.atom(node), &mut out);
            self.write_rings(node, &mut out);

            let children = &tree.children[node.index()];
            let Some((&(backbone, backbone_order), branches)) = children.split_last() else {
                continue;
            };
            steps.push(Step::Enter(backbone, backbone_order));
            for &(child, order) in branches.iter().rev() {
                steps.push(Step::Close);
                steps.push(Step::Enter(child, order));
                steps.push(Step::Open);
            }
        }
        out
    }

    fn write_rings(&mut self, node: NodeIndex, out: &mut String) {
        let tree = self.tree;
        let mut rings: Vec<(usize, &'static str)> = Vec::new();
        for rc in &tree.closures[node.index()] {
            let key = closure_key(node, rc.other);
            match self.ring_numbers.get(&key) {
                Some(&num) => rings.push((num, rc.order.symbol())),
                None => {
                    let num = self.next_ring;
                    self.next_ring += 1;
                    self.ring_numbers.insert(key, num);
                    rings.push((num, ""));
                }
            }
        }
        rings.sort_unstable();
        for (num, symbol) in rings {
            out.push_str(symbol);
            write_ring_number(num, out);
        }
    }
}

fn closure_key(a: NodeIndex, b: NodeIndex) -> (usize, usize) {
    let (a, b) = (a.index(), b.index());
    (a.min(b), a.max(b))
}

fn write_label<A: HasElement + HasFormalCharge>(atom: &A, out: &mut String) {
    let symbol = atom.element().symbol();
    let charge = atom.formal_charge();
    if charge == 0 {
        out.push_str(symbol);
        return;
    }
    out.push('[');
    out.push_str(symbol);
    out.push(if charge > 0 { '+' } else { '-' });
    let magnitude = charge.unsigned_abs();
    if magnitude > 1 {
        out.push_str(&magnitude.to_string());
    }
    out.push(']');
}

fn write_ring_number(num: usize, out: &mut String) {
    match num {
        0..=9 => out.push_str(&num.to_string()),
        10..=99 => {
            out.push('%');
            out.push_str(&num.to_string());
        }
        _ => {
            out.push_str("%(");
            out.push_str(&num.to_string());
            out.push(')');
        }
    }
}
