//! Backend-neutral mixed-integer model.
//!
//! The builder writes into this plain structure; adapters translate it into a
//! concrete backend. Nothing in here knows about any solver crate.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Index of a variable inside one [`MipModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Continuous,
    Integer,
    Binary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDef {
    pub name: String,
    pub kind: VarKind,
    pub lower: f64,
    pub upper: f64,
}

impl VarDef {
    pub fn is_fixed(&self) -> bool {
        self.lower == self.upper
    }
}

/// `Σ coef·var + constant`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinExpr {
    pub terms: Vec<(VarId, f64)>,
    pub constant: f64,
}

impl LinExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    pub fn add_term(&mut self, var: VarId, coef: f64) -> &mut Self {
        if coef != 0.0 {
            self.terms.push((var, coef));
        }
        self
    }

    pub fn add_constant(&mut self, value: f64) -> &mut Self {
        self.constant += value;
        self
    }

    pub fn add_expr(&mut self, other: &LinExpr, scale: f64) -> &mut Self {
        if scale == 0.0 {
            return self;
        }
        self.terms
            .extend(other.terms.iter().map(|&(v, c)| (v, c * scale)));
        self.constant += other.constant * scale;
        self
    }

    /// Sum of variables with unit coefficients.
    pub fn sum<I: IntoIterator<Item = VarId>>(vars: I) -> Self {
        Self {
            terms: vars.into_iter().map(|v| (v, 1.0)).collect(),
            constant: 0.0,
        }
    }

    /// Weighted sum.
    pub fn weighted<I: IntoIterator<Item = (VarId, f64)>>(terms: I) -> Self {
        let mut expr = Self::new();
        for (v, c) in terms {
            expr.add_term(v, c);
        }
        expr
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Value under a full assignment, indexed by `VarId`.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(v, c)| c * values.get(v.0).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }
}

impl From<VarId> for LinExpr {
    fn from(var: VarId) -> Self {
        Self {
            terms: vec![(var, 1.0)],
            constant: 0.0,
        }
    }
}

impl Add for LinExpr {
    type Output = LinExpr;
    fn add(mut self, rhs: LinExpr) -> LinExpr {
        self.add_expr(&rhs, 1.0);
        self
    }
}

impl Sub for LinExpr {
    type Output = LinExpr;
    fn sub(mut self, rhs: LinExpr) -> LinExpr {
        self.add_expr(&rhs, -1.0);
        self
    }
}

impl Mul<f64> for LinExpr {
    type Output = LinExpr;
    fn mul(self, rhs: f64) -> LinExpr {
        let mut out = LinExpr::new();
        out.add_expr(&self, rhs);
        out
    }
}

impl Neg for LinExpr {
    type Output = LinExpr;
    fn neg(self) -> LinExpr {
        self * -1.0
    }
}

impl AddAssign<LinExpr> for LinExpr {
    fn add_assign(&mut self, rhs: LinExpr) {
        self.add_expr(&rhs, 1.0);
    }
}

impl AddAssign<(VarId, f64)> for LinExpr {
    fn add_assign(&mut self, (var, coef): (VarId, f64)) {
        self.add_term(var, coef);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

/// `terms (sense) rhs`. Constants are folded into `rhs` on insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Constraint family, for diagnostics.
    pub label: &'static str,
    pub terms: Vec<(VarId, f64)>,
    pub sense: Sense,
    pub rhs: f64,
}

impl Constraint {
    pub fn lhs(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(v, c)| c * values.get(v.0).copied().unwrap_or(0.0))
            .sum()
    }

    pub fn is_satisfied(&self, values: &[f64], tol: f64) -> bool {
        let lhs = self.lhs(values);
        match self.sense {
            Sense::Le => lhs <= self.rhs + tol,
            Sense::Ge => lhs >= self.rhs - tol,
            Sense::Eq => (lhs - self.rhs).abs() <= tol,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectiveSense {
    #[default]
    Maximize,
    Minimize,
}

#[derive(Debug, Clone, Default)]
pub struct MipModel {
    vars: Vec<VarDef>,
    constraints: Vec<Constraint>,
    objective: LinExpr,
    sense: ObjectiveSense,
}

impl MipModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_var(&mut self, name: impl Into<String>, kind: VarKind, lower: f64, upper: f64) -> VarId {
        let id = VarId(self.vars.len());
        self.vars.push(VarDef {
            name: name.into(),
            kind,
            lower,
            upper,
        });
        id
    }

    pub fn binary(&mut self, name: impl Into<String>) -> VarId {
        self.add_var(name, VarKind::Binary, 0.0, 1.0)
    }

    pub fn integer(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> VarId {
        self.add_var(name, VarKind::Integer, lower, upper)
    }

    pub fn continuous(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> VarId {
        self.add_var(name, VarKind::Continuous, lower, upper)
    }

    /// Pin a variable to a single value.
    pub fn fix(&mut self, var: VarId, value: f64) {
        if let Some(def) = self.vars.get_mut(var.0) {
            def.lower = value;
            def.upper = value;
        }
    }

    pub fn set_upper(&mut self, var: VarId, upper: f64) {
        if let Some(def) = self.vars.get_mut(var.0) {
            def.upper = def.upper.min(upper);
        }
    }

    pub fn set_lower(&mut self, var: VarId, lower: f64) {
        if let Some(def) = self.vars.get_mut(var.0) {
            def.lower = def.lower.max(lower);
        }
    }

    pub fn add_constraint(&mut self, label: &'static str, expr: LinExpr, sense: Sense, rhs: f64) {
        self.constraints.push(Constraint {
            label,
            terms: expr.terms,
            sense,
            rhs: rhs - expr.constant,
        });
    }

    pub fn le(&mut self, label: &'static str, expr: LinExpr, rhs: f64) {
        self.add_constraint(label, expr, Sense::Le, rhs);
    }

    pub fn ge(&mut self, label: &'static str, expr: LinExpr, rhs: f64) {
        self.add_constraint(label, expr, Sense::Ge, rhs);
    }

    pub fn eq(&mut self, label: &'static str, expr: LinExpr, rhs: f64) {
        self.add_constraint(label, expr, Sense::Eq, rhs);
    }

    pub fn set_objective(&mut self, expr: LinExpr, sense: ObjectiveSense) {
        self.objective = expr;
        self.sense = sense;
    }

    pub fn vars(&self) -> &[VarDef] {
        &self.vars
    }

    pub fn var(&self, id: VarId) -> &VarDef {
        &self.vars[id.0]
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinExpr {
        &self.objective
    }

    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn num_integer_vars(&self) -> usize {
        self.vars
            .iter()
            .filter(|v| v.kind != VarKind::Continuous)
            .count()
    }

    /// Labels of constraints (and names of variables) the assignment breaks.
    pub fn violations(&self, values: &[f64], tol: f64) -> Vec<String> {
        let mut out = Vec::new();
        for (i, def) in self.vars.iter().enumerate() {
            let v = values.get(i).copied().unwrap_or(0.0);
            if v < def.lower - tol || v > def.upper + tol {
                out.push(format!("bound {} = {v}", def.name));
            }
            if def.kind != VarKind::Continuous && (v - v.round()).abs() > tol {
                out.push(format!("integrality {} = {v}", def.name));
            }
        }
        for c in &self.constraints {
            if !c.is_satisfied(values, tol) {
                out.push(format!("{}: lhs {} vs rhs {}", c.label, c.lhs(values), c.rhs));
            }
        }
        out
    }
}
