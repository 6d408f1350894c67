//! The tree-walking evaluator.
//!
//! Evaluation is strictly left-to-right over the AST, synchronous and
//! non-suspending. The current input collection is the implicit
//! receiver; iteration state travels in immutable `Scope` frames.
//! Higher-order functions re-evaluate their argument subtrees once per
//! element with `$this` and `$index` bound; `iif` and the boolean
//! operators short-circuit, so the non-taken branch is never evaluated.

use crate::ast::{AddOp, EqOp, Expr, MembershipOp, MulOp, TypeOpKind};
use crate::context::{Clock, Scope};
use crate::error::{Error, Result};
use crate::functions::{self, type_ops, utility, FnContext};
use crate::model::ModelNavigator;
use crate::ops::{arithmetic, boolean, compare, equality};
use crate::quantity::Quantity;
use crate::registry;
use crate::types::{self, TypeName};
use crate::value::{Collection, Value};
use crate::variables::Variables;

pub struct Evaluator<'e> {
    pub navigator: &'e dyn ModelNavigator,
    pub variables: &'e Variables,
    pub resource: Collection,
    pub clock: Clock,
}

impl Evaluator<'_> {
    /// Evaluate a parsed expression against the root resource.
    pub fn evaluate(&self, expr: &Expr) -> Result<Collection> {
        self.eval(expr, &self.resource, &Scope::default())
    }

    fn eval(&self, expr: &Expr, input: &Collection, scope: &Scope) -> Result<Collection> {
        match expr {
            // Literals
            Expr::Empty => Ok(Collection::empty()),
            Expr::Boolean(b) => Ok(Collection::singleton(Value::Boolean(*b))),
            Expr::Integer(i) => Ok(Collection::singleton(Value::Integer(*i))),
            Expr::Long(l) => Ok(Collection::singleton(Value::Long(*l))),
            Expr::Decimal(d) => Ok(Collection::singleton(Value::Decimal(*d))),
            Expr::Str(s) => Ok(Collection::singleton(Value::string(s))),
            Expr::Date(d) => Ok(Collection::singleton(Value::Date(*d))),
            Expr::DateTime(dt) => Ok(Collection::singleton(Value::DateTime(*dt))),
            Expr::Time(t) => Ok(Collection::singleton(Value::Time(*t))),
            Expr::Quantity { value, unit } => Ok(Collection::singleton(Value::Quantity(
                Quantity::from_literal(*value, unit.as_deref()),
            ))),

            // Terms
            Expr::Identifier(name) => self.property_access(input, name),
            Expr::This => Ok(match &scope.this {
                Some(v) => Collection::singleton(v.clone()),
                None => input.clone(),
            }),
            Expr::IndexVar => Ok(match scope.index {
                Some(i) => Collection::singleton(Value::Integer(i)),
                None => Collection::empty(),
            }),
            Expr::TotalVar => Ok(scope.total.clone().unwrap_or_default()),
            Expr::ExternalConstant(name) => {
                crate::variables::resolve(name, &self.resource, self.variables)
            }
            Expr::Parenthesized(inner) => self.eval(inner, input, scope),

            Expr::Member { base, name } => {
                let base = self.eval(base, input, scope)?;
                self.property_access(&base, name)
            }

            Expr::Indexer { base, index } => {
                let base = self.eval(base, input, scope)?;
                let index = self.eval(index, input, scope)?;
                if index.is_empty() || base.is_empty() {
                    return Ok(Collection::empty());
                }
                let i = index.as_integer("indexer")?;
                Ok(match usize::try_from(i).ok().and_then(|i| base.get(i)) {
                    Some(v) => Collection::singleton(v.clone()),
                    None => Collection::empty(),
                })
            }

            Expr::Function { base, name, args } => {
                let receiver = match base {
                    Some(base) => self.eval(base, input, scope)?,
                    None => input.clone(),
                };
                self.invoke(name, receiver, args, input, scope)
            }

            Expr::Polarity { negate, operand } => {
                let operand = self.eval(operand, input, scope)?;
                let Some(value) = operand.singleton_value("unary +/-")? else {
                    return Ok(Collection::empty());
                };
                if *negate {
                    Ok(Collection::singleton(arithmetic::negate(&value)?))
                } else {
                    arithmetic::check_numeric(&value)?;
                    Ok(Collection::singleton(value))
                }
            }

            Expr::Multiplicative { op, left, right } => {
                let left = self.eval(left, input, scope)?;
                let right = self.eval(right, input, scope)?;
                let (Some(l), Some(r)) = (
                    left.singleton_value("arithmetic operand")?,
                    right.singleton_value("arithmetic operand")?,
                ) else {
                    return Ok(Collection::empty());
                };
                let out = match op {
                    MulOp::Multiply => arithmetic::multiply(&l, &r)?,
                    MulOp::Divide => arithmetic::divide(&l, &r)?,
                    MulOp::Div => arithmetic::integer_div(&l, &r)?,
                    MulOp::Mod => arithmetic::integer_mod(&l, &r)?,
                };
                Ok(out.map(Collection::singleton).unwrap_or_default())
            }

            Expr::Additive { op, left, right } => {
                let left = self.eval(left, input, scope)?;
                let right = self.eval(right, input, scope)?;
                if *op == AddOp::Concat {
                    return concat(&left, &right);
                }
                let (Some(l), Some(r)) = (
                    left.singleton_value("arithmetic operand")?,
                    right.singleton_value("arithmetic operand")?,
                ) else {
                    return Ok(Collection::empty());
                };
                let out = match op {
                    AddOp::Plus => arithmetic::add(&l, &r)?,
                    AddOp::Minus => arithmetic::subtract(&l, &r)?,
                    AddOp::Concat => unreachable!(),
                };
                Ok(out.map(Collection::singleton).unwrap_or_default())
            }

            Expr::TypeOp {
                op,
                operand,
                specifier,
            } => {
                let operand = self.eval(operand, input, scope)?;
                let ty = self.resolve_type(specifier)?;
                match op {
                    TypeOpKind::Is => type_ops::is_type(operand, &ty, self.navigator),
                    TypeOpKind::As => type_ops::as_type(operand, &ty, self.navigator),
                }
            }

            Expr::Union { left, right } => {
                let left = self.eval(left, input, scope)?;
                let right = self.eval(right, input, scope)?;
                functions::combining::union(left, &right)
            }

            Expr::Inequality { op, left, right } => {
                let left = self.eval(left, input, scope)?;
                let right = self.eval(right, input, scope)?;
                let (Some(l), Some(r)) = (
                    left.singleton_value("comparison operand")?,
                    right.singleton_value("comparison operand")?,
                ) else {
                    return Ok(Collection::empty());
                };
                Ok(match compare::compare_values(&l, &r)? {
                    Some(ordering) => {
                        Collection::singleton(Value::Boolean(compare::apply(*op, ordering)))
                    }
                    None => Collection::empty(),
                })
            }

            Expr::Equality { op, left, right } => {
                let left = self.eval(left, input, scope)?;
                let right = self.eval(right, input, scope)?;
                match op {
                    EqOp::Equal | EqOp::NotEqual => {
                        if left.is_empty() || right.is_empty() {
                            return Ok(Collection::empty());
                        }
                        Ok(match equality::collections_equal(&left, &right) {
                            Some(eq) => Collection::singleton(Value::Boolean(
                                if *op == EqOp::Equal { eq } else { !eq },
                            )),
                            None => Collection::empty(),
                        })
                    }
                    EqOp::Equivalent | EqOp::NotEquivalent => {
                        let eq = equality::collections_equivalent(&left, &right);
                        Ok(Collection::singleton(Value::Boolean(
                            if *op == EqOp::Equivalent { eq } else { !eq },
                        )))
                    }
                }
            }

            Expr::Membership { op, left, right } => {
                let left = self.eval(left, input, scope)?;
                let right = self.eval(right, input, scope)?;
                let (item, collection) = match op {
                    MembershipOp::In => (left, right),
                    MembershipOp::Contains => (right, left),
                };
                let Some(needle) = item.singleton_value("membership operand")? else {
                    return Ok(Collection::empty());
                };
                Ok(Collection::singleton(Value::Boolean(
                    equality::contains_by_equality(&collection, &needle),
                )))
            }

            // Boolean operators short-circuit on a decided left operand.
            Expr::And { left, right } => {
                let l = self.eval(left, input, scope)?.boolean_operand("'and'")?;
                if l == Some(false) {
                    return Ok(Collection::singleton(Value::Boolean(false)));
                }
                let r = self.eval(right, input, scope)?.boolean_operand("'and'")?;
                Ok(to_collection(boolean::and(l, r)))
            }
            Expr::Or {
                exclusive, left, right,
            } => {
                let l = self.eval(left, input, scope)?.boolean_operand("'or'")?;
                if !*exclusive && l == Some(true) {
                    return Ok(Collection::singleton(Value::Boolean(true)));
                }
                let r = self.eval(right, input, scope)?.boolean_operand("'or'")?;
                Ok(to_collection(if *exclusive {
                    boolean::xor(l, r)
                } else {
                    boolean::or(l, r)
                }))
            }
            Expr::Implies { left, right } => {
                let l = self
                    .eval(left, input, scope)?
                    .boolean_operand("'implies'")?;
                if l == Some(false) {
                    return Ok(Collection::singleton(Value::Boolean(true)));
                }
                let r = self
                    .eval(right, input, scope)?
                    .boolean_operand("'implies'")?;
                Ok(to_collection(boolean::implies(l, r)))
            }
        }
    }

    /// Identifier and member access. When the name matches the element's
    /// type name the element itself is the result (`Patient.name` on a
    /// Patient resource); otherwise it is a lenient property lookup,
    /// flat-mapped across the receiver.
    fn property_access(&self, input: &Collection, name: &str) -> Result<Collection> {
        let mut out = Collection::empty();
        for item in input.iter() {
            let Value::Node(node) = item else {
                continue;
            };
            if let Some(ty) = self.navigator.type_of(node) {
                if ty.name == name {
                    out.push(item.clone());
                    continue;
                }
            }
            if let Some(found) = self.navigator.get_property(node, name) {
                out.extend(found);
            }
        }
        Ok(out)
    }

    fn resolve_type(&self, specifier: &str) -> Result<TypeName> {
        types::resolve_specifier(specifier).ok_or_else(|| {
            Error::UnknownIdentifier(format!("unknown type specifier '{specifier}'"))
        })
    }

    /// Type-specifier argument of `is()` / `as()` / `ofType()`: the
    /// argument AST must be a plain or qualified name, never evaluated.
    fn specifier_text(arg: &Expr) -> Result<String> {
        match arg {
            Expr::Identifier(name) => Ok(name.clone()),
            Expr::Member { base, name } => {
                if let Expr::Identifier(ns) = base.as_ref() {
                    Ok(format!("{ns}.{name}"))
                } else {
                    Err(Error::Type(
                        "type argument must be a plain or qualified type name".to_string(),
                    ))
                }
            }
            _ => Err(Error::Type(
                "type argument must be a plain or qualified type name".to_string(),
            )),
        }
    }

    fn invoke(
        &self,
        name: &str,
        receiver: Collection,
        args: &[Expr],
        input: &Collection,
        scope: &Scope,
    ) -> Result<Collection> {
        let spec = registry::validate(name, args.len())?;

        if spec.type_args {
            let ty = self.resolve_type(&Self::specifier_text(&args[0])?)?;
            return match name {
                "ofType" => type_ops::of_type(receiver, &ty, self.navigator),
                "is" => type_ops::is_type(receiver, &ty, self.navigator),
                "as" => type_ops::as_type(receiver, &ty, self.navigator),
                _ => unreachable!("no other type-argument functions"),
            };
        }

        if spec.higher_order {
            return self.invoke_higher_order(name, receiver, args, input, scope);
        }

        let mut evaluated = Vec::with_capacity(args.len());
        for arg in args {
            evaluated.push(self.eval(arg, input, scope)?);
        }
        let cx = FnContext {
            navigator: self.navigator,
            clock: &self.clock,
        };
        functions::call(name, receiver, &evaluated, &cx)
    }

    fn invoke_higher_order(
        &self,
        name: &str,
        receiver: Collection,
        args: &[Expr],
        input: &Collection,
        scope: &Scope,
    ) -> Result<Collection> {
        match name {
            "where" => {
                let mut out = Collection::empty();
                for (i, item) in receiver.iter().enumerate() {
                    if self.criterion(&args[0], item, i, scope)? == Some(true) {
                        out.push(item.clone());
                    }
                }
                Ok(out)
            }

            "select" => {
                let mut out = Collection::empty();
                for (i, item) in receiver.iter().enumerate() {
                    let frame = scope.iteration(item.clone(), i);
                    let projected =
                        self.eval(&args[0], &Collection::singleton(item.clone()), &frame)?;
                    out.extend(projected);
                }
                Ok(out)
            }

            // Iterate the projection to a fixed point: stop when a round
            // adds nothing new (per FHIRPath equality).
            "repeat" => {
                let mut out = Collection::empty();
                let mut frontier: Vec<Value> = receiver.iter().cloned().collect();
                while !frontier.is_empty() {
                    let mut next = Vec::new();
                    for (i, item) in frontier.iter().enumerate() {
                        let frame = scope.iteration(item.clone(), i);
                        let projected =
                            self.eval(&args[0], &Collection::singleton(item.clone()), &frame)?;
                        for value in projected {
                            if !equality::contains_by_equality(&out, &value) {
                                out.push(value.clone());
                                next.push(value);
                            }
                        }
                    }
                    frontier = next;
                }
                Ok(out)
            }

            "all" => {
                for (i, item) in receiver.iter().enumerate() {
                    if self.criterion(&args[0], item, i, scope)? != Some(true) {
                        return Ok(Collection::singleton(Value::Boolean(false)));
                    }
                }
                Ok(Collection::singleton(Value::Boolean(true)))
            }

            "exists" => {
                if args.is_empty() {
                    return functions::existence::exists(receiver);
                }
                for (i, item) in receiver.iter().enumerate() {
                    if self.criterion(&args[0], item, i, scope)? == Some(true) {
                        return Ok(Collection::singleton(Value::Boolean(true)));
                    }
                }
                Ok(Collection::singleton(Value::Boolean(false)))
            }

            // Only the taken branch is evaluated.
            "iif" => {
                let condition = self
                    .eval(&args[0], &receiver, scope)?
                    .boolean_operand("iif() condition")?;
                if condition == Some(true) {
                    self.eval(&args[1], &receiver, scope)
                } else if let Some(otherwise) = args.get(2) {
                    self.eval(otherwise, &receiver, scope)
                } else {
                    Ok(Collection::empty())
                }
            }

            "aggregate" => {
                let mut total = match args.get(1) {
                    Some(init) => self.eval(init, input, scope)?,
                    None => Collection::empty(),
                };
                for (i, item) in receiver.iter().enumerate() {
                    let frame = scope.aggregate_step(item.clone(), i, total);
                    total = self.eval(&args[0], &Collection::singleton(item.clone()), &frame)?;
                }
                Ok(total)
            }

            "trace" => {
                let label = self.eval(&args[0], input, scope)?;
                let projected = match args.get(1) {
                    Some(projection) => Some(self.eval(projection, &receiver, scope)?),
                    None => None,
                };
                utility::trace(receiver, &label, projected.as_ref())
            }

            other => Err(Error::UnknownIdentifier(format!(
                "unknown function '{other}()'"
            ))),
        }
    }

    /// Evaluate a criteria expression against one element, as a
    /// three-valued boolean.
    fn criterion(
        &self,
        criteria: &Expr,
        item: &Value,
        index: usize,
        scope: &Scope,
    ) -> Result<Option<bool>> {
        let frame = scope.iteration(item.clone(), index);
        self.eval(criteria, &Collection::singleton(item.clone()), &frame)?
            .boolean_operand("criteria")
    }
}

fn to_collection(value: Option<bool>) -> Collection {
    match value {
        Some(b) => Collection::singleton(Value::Boolean(b)),
        None => Collection::empty(),
    }
}

/// `&` concatenation: empty operands read as the empty string.
fn concat(left: &Collection, right: &Collection) -> Result<Collection> {
    let read = |col: &Collection| -> Result<String> {
        match col.singleton_value("'&' operand")? {
            None => Ok(String::new()),
            Some(Value::String(s)) => Ok(s.to_string()),
            Some(other) => Err(Error::Type(format!(
                "'&' requires string operands, found {other:?}"
            ))),
        }
    };
    Ok(Collection::singleton(Value::string(format!(
        "{}{}",
        read(left)?,
        read(right)?
    ))))
}
