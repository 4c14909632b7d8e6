//! Canonical atom ranking.
//!
//! Every atom gets a rank that depends only on the graph, never on the
//! order atoms were drawn in. Ranks start from a per-atom invariant and
//! are refined Morgan-style: each rank owns a prime, and an atom's next
//! signature is the product of its neighbours' primes raised to the bond
//! order. When refinement stalls with ties left, each atom of the lowest
//! tied class in turn is nudged below its peers and refined again. The
//! search continues until every atom is distinct, and the distinct
//! ranking whose trace reads smallest is kept.

use std::collections::{BTreeMap, HashMap};

use petgraph::graph::NodeIndex;
use tracing::{instrument, trace, warn};

use crate::mol::Mol;
use crate::traits::{HasAtomicNum, HasBondOrder, HasElement, HasFormalCharge};
use crate::valence::{bond_order_sum, raw_hydrogen_count};

/// Lower bound on the iteration ceiling so tiny molecules still get a
/// few rounds.
pub const MIN_ITERATION_CEILING: usize = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RankOptions {
    /// Maximum number of rounds for each refinement run. The tie-breaking
    /// search may individualize at most `n` times this many atoms.
    /// `None` means `max(n², 16)` for `n` atoms.
    pub max_iterations: Option<usize>,
}

impl RankOptions {
    fn ceiling(&self, atoms: usize) -> usize {
        self.max_iterations
            .unwrap_or_else(|| atoms.saturating_mul(atoms).max(MIN_ITERATION_CEILING))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CanonError {
    /// The iteration ceiling was reached before every atom had its own
    /// rank. Returning a partial order would not be canonical.
    #[error(
        "rank refinement did not converge after {iterations} iterations ({distinct} distinct ranks for {atoms} atoms)"
    )]
    NonConvergence {
        iterations: usize,
        distinct: usize,
        atoms: usize,
    },
}

/// A total order over a molecule's atoms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ranking {
    ranks: HashMap<NodeIndex, usize>,
    order: Vec<NodeIndex>,
}

impl Ranking {
    /// 1-based rank of an atom.
    pub fn rank(&self, idx: NodeIndex) -> Option<usize> {
        self.ranks.get(&idx).copied()
    }

    /// Atoms from rank 1 upwards.
    pub fn order(&self) -> &[NodeIndex] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Ranking that follows `order`, rank 1 first.
    #[cfg(test)]
    pub(crate) fn from_order(order: Vec<NodeIndex>) -> Self {
        Self {
            ranks: order.iter().enumerate().map(|(i, &idx)| (idx, i + 1)).collect(),
            order,
        }
    }
}

/// Per-atom starting invariant. Field order is comparison priority.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct AtomInvariant {
    degree: usize,
    order_sum: u8,
    atomic_num: u8,
    anion_hydrogens: i8,
    charge_magnitude: u8,
    hydrogens: i8,
    /// Separates cation from anion when nothing above does.
    charge: i8,
}

/// Product of primes, kept factorised as (prime, exponent) pairs in
/// ascending prime order. Equal exactly when the products are equal.
type Signature = Vec<(u64, u32)>;

type TraceEntry = (usize, AtomInvariant, Vec<(usize, u8)>);

/// Dense snapshot of the molecule that ranking works on. Atom `i` is the
/// `i`-th atom in creation order.
struct RankContext {
    atoms: Vec<NodeIndex>,
    neighbors: Vec<Vec<(usize, u8)>>,
    invariants: Vec<AtomInvariant>,
    primes: Vec<u64>,
    ceiling: usize,
}

impl RankContext {
    fn new<A, B>(mol: &Mol<A, B>, options: &RankOptions) -> Self
    where
        A: HasElement + HasFormalCharge,
        B: HasBondOrder,
    {
        let atoms: Vec<NodeIndex> = mol.atoms().collect();
        let dense: HashMap<NodeIndex, usize> =
            atoms.iter().enumerate().map(|(i, &idx)| (idx, i)).collect();

        let neighbors = atoms
            .iter()
            .map(|&idx| {
                mol.bonds_of(idx)
                    .filter_map(|e| {
                        let other = mol.other_end(e, idx)?;
                        let order = mol.bond(e).bond_order().valence();
                        dense.get(&other).map(|&j| (j, order))
                    })
                    .collect()
            })
            .collect();

        let invariants = atoms.iter().map(|&idx| atom_invariant(mol, idx)).collect();

        Self {
            primes: first_primes(atoms.len()),
            ceiling: options.ceiling(atoms.len()),
            atoms,
            neighbors,
            invariants,
        }
    }

    fn len(&self) -> usize {
        self.atoms.len()
    }

    /// Ranks after invariant refinement, before any tie is broken.
    fn invariant_ranks(&self) -> Result<Vec<usize>, CanonError> {
        let mut ranks = compress(&vec![1; self.len()], &self.invariants);
        self.refine(&mut ranks)?;
        Ok(ranks)
    }

    fn signature(&self, atom: usize, ranks: &[usize]) -> Signature {
        let mut factors: BTreeMap<u64, u32> = BTreeMap::new();
        for &(nb, order) in &self.neighbors[atom] {
            *factors.entry(self.primes[ranks[nb] - 1]).or_default() += order as u32;
        }
        factors.into_iter().collect()
    }

    fn refine(&self, ranks: &mut Vec<usize>) -> Result<(), CanonError> {
        let mut rounds = 0;
        loop {
            if rounds >= self.ceiling {
                return Err(self.non_convergence(rounds, ranks));
            }
            rounds += 1;

            let signatures: Vec<Signature> =
                (0..self.len()).map(|i| self.signature(i, ranks)).collect();
            let next = compress(ranks, &signatures);
            trace!(round = rounds, distinct = count_distinct(&next), "refinement round");
            if next == *ranks {
                return Ok(());
            }
            *ranks = next;
        }
    }

    /// Nudges `atom` below the rest of its class and refines.
    fn individualize(&self, ranks: &[usize], atom: usize) -> Result<Vec<usize>, CanonError> {
        let mut perturbed: Vec<usize> = ranks.iter().map(|&r| r * 2).collect();
        perturbed[atom] -= 1;
        let mut child = compress(ranks, &perturbed);
        self.refine(&mut child)?;
        Ok(child)
    }

    /// Rank-ordered description of the graph under `ranks`.
    fn trace(&self, ranks: &[usize]) -> Vec<TraceEntry> {
        let mut entries: Vec<TraceEntry> = (0..self.len())
            .map(|i| {
                let mut nbs: Vec<(usize, u8)> = self.neighbors[i]
                    .iter()
                    .map(|&(nb, order)| (ranks[nb], order))
                    .collect();
                nbs.sort_unstable();
                (ranks[i], self.invariants[i].clone(), nbs)
            })
            .collect();
        entries.sort();
        entries
    }

    fn non_convergence(&self, iterations: usize, ranks: &[usize]) -> CanonError {
        let distinct = count_distinct(ranks);
        warn!(
            iterations,
            distinct,
            atoms = self.len(),
            "canonical ranking hit its iteration ceiling"
        );
        CanonError::NonConvergence {
            iterations,
            distinct,
            atoms: self.len(),
        }
    }
}

/// A fully distinct ranking reached by the tie-breaking search.
#[derive(Clone)]
struct Leaf {
    trace: Vec<TraceEntry>,
    ranks: Vec<usize>,
    /// Atoms individualized on the way down, outermost first.
    path: Vec<usize>,
}

enum Descent {
    Done,
    /// The subtree just left is an automorphic image of the first one.
    Automorphic,
}

/// Individualization-refinement search over tied classes.
///
/// Every branch individualizes one atom of the lowest tied class and
/// refines. Leaves are compared by their trace and the smallest wins, so
/// the result does not depend on creation order. A leaf whose trace
/// equals the first leaf's yields an automorphism; those prune sibling
/// candidates on the first path and cut short any other subtree.
struct TieBreaker<'a> {
    ctx: &'a RankContext,
    budget: usize,
    spent: usize,
    first: Option<Leaf>,
    best: Option<Leaf>,
    /// Each automorphism as an atom map, with the length of the first
    /// path prefix it fixes.
    automorphisms: Vec<(usize, Vec<usize>)>,
}

impl<'a> TieBreaker<'a> {
    fn new(ctx: &'a RankContext) -> Self {
        Self {
            ctx,
            budget: ctx.ceiling.saturating_mul(ctx.len()),
            spent: 0,
            first: None,
            best: None,
            automorphisms: Vec::new(),
        }
    }

    fn run(mut self, ranks: Vec<usize>) -> Result<Vec<usize>, CanonError> {
        let mut path = Vec::new();
        self.descend(ranks.clone(), &mut path)?;
        trace!(
            individualized = self.spent,
            automorphisms = self.automorphisms.len(),
            "tie-breaking search finished"
        );
        match self.best {
            Some(leaf) => Ok(leaf.ranks),
            None => Err(self.ctx.non_convergence(self.spent, &ranks)),
        }
    }

    fn descend(
        &mut self,
        ranks: Vec<usize>,
        path: &mut Vec<usize>,
    ) -> Result<Descent, CanonError> {
        let Some(cell_rank) = lowest_tied_rank(&ranks) else {
            return Ok(self.visit_leaf(ranks, path));
        };
        let on_first_path = self
            .first
            .as_ref()
            .is_none_or(|first| first.path.starts_with(path.as_slice()));
        let cell: Vec<usize> = (0..ranks.len()).filter(|&i| ranks[i] == cell_rank).collect();

        let mut tried: Vec<usize> = Vec::new();
        for candidate in cell {
            if on_first_path && self.shares_orbit(path.len(), candidate, &tried) {
                continue;
            }
            tried.push(candidate);

            if self.spent >= self.budget {
                return Err(self.ctx.non_convergence(self.spent, &ranks));
            }
            self.spent += 1;
            let child = self.ctx.individualize(&ranks, candidate)?;

            path.push(candidate);
            let outcome = self.descend(child, path);
            path.pop();
            if matches!(outcome?, Descent::Automorphic) && !on_first_path {
                return Ok(Descent::Automorphic);
            }
        }
        Ok(Descent::Done)
    }

    fn visit_leaf(&mut self, ranks: Vec<usize>, path: &[usize]) -> Descent {
        let trace = self.ctx.trace(&ranks);
        if let Some(first) = &self.first {
            if first.trace == trace {
                let fixed = common_prefix(&first.path, path);
                let map = automorphism(&first.ranks, &ranks);
                self.automorphisms.push((fixed, map));
                return Descent::Automorphic;
            }
        }

        let leaf = Leaf {
            trace,
            ranks,
            path: path.to_vec(),
        };
        if self.best.as_ref().is_none_or(|best| leaf.trace < best.trace) {
            self.best = Some(leaf.clone());
        }
        if self.first.is_none() {
            self.first = Some(leaf);
        }
        Descent::Done
    }

    /// Whether `atom` lies in the orbit of an already tried candidate
    /// under the automorphisms that fix the first `depth` path atoms.
    fn shares_orbit(&self, depth: usize, atom: usize, tried: &[usize]) -> bool {
        if tried.is_empty() {
            return false;
        }
        let mut parent: Vec<usize> = (0..self.ctx.len()).collect();
        for (_, map) in self.automorphisms.iter().filter(|(fixed, _)| *fixed >= depth) {
            for (from, &to) in map.iter().enumerate() {
                let (a, b) = (find_root(&mut parent, from), find_root(&mut parent, to));
                if a != b {
                    parent[a.max(b)] = a.min(b);
                }
            }
        }
        let root = find_root(&mut parent, atom);
        tried.iter().any(|&t| find_root(&mut parent, t) == root)
    }
}

fn common_prefix(a: &[usize], b: &[usize]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Maps each atom of the `from` leaf to the atom holding the same rank
/// in the `to` leaf.
fn automorphism(from: &[usize], to: &[usize]) -> Vec<usize> {
    let mut by_rank = vec![0; to.len()];
    for (atom, &r) in to.iter().enumerate() {
        by_rank[r - 1] = atom;
    }
    from.iter().map(|&r| by_rank[r - 1]).collect()
}

fn find_root(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]];
        x = parent[x];
    }
    x
}

fn atom_invariant<A, B>(mol: &Mol<A, B>, idx: NodeIndex) -> AtomInvariant
where
    A: HasElement + HasFormalCharge,
    B: HasBondOrder,
{
    let atom = mol.atom(idx);
    let charge = atom.formal_charge();
    let hydrogens = raw_hydrogen_count(mol, idx);
    AtomInvariant {
        degree: mol.degree(idx),
        order_sum: bond_order_sum(mol, idx),
        atomic_num: atom.atomic_num(),
        anion_hydrogens: if charge < 0 { hydrogens } else { 0 },
        charge_magnitude: charge.unsigned_abs(),
        hydrogens,
        charge,
    }
}

fn first_primes(count: usize) -> Vec<u64> {
    let mut primes: Vec<u64> = Vec::with_capacity(count);
    let mut candidate = 2u64;
    while primes.len() < count {
        if primes
            .iter()
            .take_while(|&&p| p * p <= candidate)
            .all(|&p| candidate % p != 0)
        {
            primes.push(candidate);
        }
        candidate += 1;
    }
    primes
}

/// Dense 1-based ranks ordered by `(prev, key)`. Atoms keep their
/// previous relative order, so this only ever splits classes.
fn compress<K: Ord>(prev: &[usize], keys: &[K]) -> Vec<usize> {
    let n = prev.len();
    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by(|&a, &b| (prev[a], &keys[a]).cmp(&(prev[b], &keys[b])));
    let mut ranks = vec![0usize; n];
    let mut current = 0;
    for (pos, &i) in indices.iter().enumerate() {
        let is_new = pos == 0 || {
            let p = indices[pos - 1];
            prev[p] != prev[i] || keys[p] != keys[i]
        };
        if is_new {
            current += 1;
        }
        ranks[i] = current;
    }
    ranks
}

fn count_distinct(ranks: &[usize]) -> usize {
    let mut sorted: Vec<usize> = ranks.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len()
}

fn lowest_tied_rank(ranks: &[usize]) -> Option<usize> {
    let mut sorted: Vec<usize> = ranks.to_vec();
    sorted.sort_unstable();
    sorted.windows(2).find(|w| w[0] == w[1]).map(|w| w[0])
}

pub fn canonical_ranking<A, B>(mol: &Mol<A, B>) -> Result<Ranking, CanonError>
where
    A: HasElement + HasFormalCharge,
    B: HasBondOrder,
{
    canonical_ranking_with(mol, &RankOptions::default())
}

#[instrument(skip_all, fields(atoms = mol.atom_count()))]
pub fn canonical_ranking_with<A, B>(
    mol: &Mol<A, B>,
    options: &RankOptions,
) -> Result<Ranking, CanonError>
where
    A: HasElement + HasFormalCharge,
    B: HasBondOrder,
{
    let ctx = RankContext::new(mol, options);
    if ctx.len() == 0 {
        return Ok(Ranking::default());
    }

    let ranks = TieBreaker::new(&ctx).run(ctx.invariant_ranks()?)?;

    let mut order: Vec<(usize, NodeIndex)> =
        ranks.iter().zip(&ctx.atoms).map(|(&r, &idx)| (r, idx)).collect();
    order.sort_unstable();

    Ok(Ranking {
        ranks: order.iter().map(|&(r, idx)| (idx, r)).collect(),
        order: order.into_iter().map(|(_, idx)| idx).collect(),
    })
}
