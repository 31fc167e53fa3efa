//! Built-in contractors.
//!
//! Contractor instances are plain values shared through `Rc`. Applications
//! that want a fixed set of ready-made instances build one [`Predefined`]
//! context and pass it around, instead of relying on global state.

use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use crate::contractor::{check_signature, Contractor, ContractorError, Slot};
use crate::interval::Interval;
use crate::value::Value;

fn scalar(values: &[Value], index: usize) -> Interval {
    // Callers check the signature first.
    values[index].as_scalar().unwrap_or_else(Interval::empty)
}

/// Contractor for `x + y = z` over three scalars.
///
/// One forward-backward pass is optimal here since every variable occurs once.
#[derive(Debug, Default)]
pub struct CtcAdd;

impl CtcAdd {
    pub fn new() -> Self {
        Self
    }
}

impl Contractor for CtcAdd {
    fn name(&self) -> &str {
        "add"
    }

    fn signature(&self) -> Vec<Slot> {
        vec![Slot::Scalar; 3]
    }

    fn contract(&self, values: &mut [Value]) -> Result<(), ContractorError> {
        check_signature(&self.signature(), values)?;
        let (mut x, mut y, mut z) = (scalar(values, 0), scalar(values, 1), scalar(values, 2));

        z = z & (x + y);
        x = x & (z - y);
        y = y & (z - x);

        if x.is_empty() || y.is_empty() || z.is_empty() {
            values.iter_mut().for_each(Value::set_empty);
            return Ok(());
        }

        values[0] = Value::Scalar(x);
        values[1] = Value::Scalar(y);
        values[2] = Value::Scalar(z);
        Ok(())
    }
}

/// Contractor for `a = b` over two domains of the same structure.
#[derive(Debug, Default)]
pub struct CtcEqual;

impl CtcEqual {
    pub fn new() -> Self {
        Self
    }
}

impl Contractor for CtcEqual {
    fn name(&self) -> &str {
        "equal"
    }

    fn signature(&self) -> Vec<Slot> {
        vec![Slot::Any, Slot::Any]
    }

    fn contract(&self, values: &mut [Value]) -> Result<(), ContractorError> {
        let r = values[0].intersect(&values[1]).ok_or_else(|| {
            ContractorError::Failed(format!(
                "cannot equate a {} with a {}",
                values[0].kind(),
                values[1].kind()
            ))
        })?;

        if r.is_empty() {
            values.iter_mut().for_each(Value::set_empty);
        } else {
            values[0] = r.clone();
            values[1] = r;
        }
        Ok(())
    }
}

type ContractFn = dyn Fn(&mut [Value]) -> Result<(), ContractorError>;

/// Contractor defined by a closure.
///
/// ```
/// use cn_rs::contractor::{Contractor, Slot};
/// use cn_rs::ctc::CtcFn;
/// use cn_rs::interval::Interval;
/// use cn_rs::value::Value;
///
/// // x >= 0
/// let positive = CtcFn::new("positive", vec![Slot::Scalar], |values| {
///     if let Value::Scalar(x) = &mut values[0] {
///         *x = *x & Interval::new(0.0, f64::INFINITY);
///     }
///     Ok(())
/// });
///
/// let mut values = vec![Value::from(Interval::new(-1.0, 1.0))];
/// positive.contract(&mut values).unwrap();
/// assert_eq!(values[0], Value::from(Interval::new(0.0, 1.0)));
/// ```
pub struct CtcFn {
    name: String,
    signature: Vec<Slot>,
    f: Box<ContractFn>,
}

impl CtcFn {
    pub fn new<F>(name: impl Into<String>, signature: Vec<Slot>, f: F) -> Self
    where
        F: Fn(&mut [Value]) -> Result<(), ContractorError> + 'static,
    {
        Self {
            name: name.into(),
            signature,
            f: Box::new(f),
        }
    }
}

impl Debug for CtcFn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CtcFn")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

impl Contractor for CtcFn {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> Vec<Slot> {
        self.signature.clone()
    }

    fn contract(&self, values: &mut [Value]) -> Result<(), ContractorError> {
        check_signature(&self.signature, values)?;
        (self.f)(values)
    }
}

/// Ready-made contractor instances, built once by the application.
#[derive(Debug, Clone)]
pub struct Predefined {
    pub add: Rc<CtcAdd>,
    pub equal: Rc<CtcEqual>,
}

impl Predefined {
    pub fn new() -> Self {
        Self {
            add: Rc::new(CtcAdd::new()),
            equal: Rc::new(CtcEqual::new()),
        }
    }
}

impl Default for Predefined {
    fn default() -> Self {
        Self::new()
    }
}
