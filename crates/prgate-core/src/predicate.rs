//! Boolean predicate algebra shared by conditions and requirements.
//!
//! [`Predicate`] is a tree of `And` / `Or` / `Not` / `Always` nodes over a
//! leaf type. Leaves decide what they inspect and which context they need;
//! the combinators only decide the order in which leaves run:
//!
//! - `And` stops at the first `false`, `Or` at the first `true`.
//! - `And([])` is `true`, `Or([])` is `false`.
//! - Any leaf error aborts the whole evaluation. A partial answer is never
//!   turned into a boolean.

use std::fmt;

use futures::future::BoxFuture;

use crate::error::EvalResult;

/// An atomic predicate evaluated against a context.
pub trait Leaf: fmt::Debug + fmt::Display + Send + Sync {
    /// What the leaf reads (and for requirements, acts) through.
    type Context: Sync + ?Sized;

    fn evaluate<'a>(&'a self, ctx: &'a Self::Context) -> BoxFuture<'a, EvalResult<bool>>;
}

/// Composable predicate over leaves of type `L`.
#[derive(Debug, Clone)]
pub enum Predicate<L> {
    Always,
    And(Vec<Predicate<L>>),
    Or(Vec<Predicate<L>>),
    Not(Box<Predicate<L>>),
    Leaf(L),
}

impl<L: Leaf> Predicate<L> {
    /// Evaluate with short-circuiting, left to right.
    pub fn evaluate<'a>(&'a self, ctx: &'a L::Context) -> BoxFuture<'a, EvalResult<bool>> {
        Box::pin(async move {
            match self {
                Predicate::Always => Ok(true),
                Predicate::And(items) => {
                    for item in items {
                        if !item.evaluate(ctx).await? {
                            return Ok(false);
                        }
                    }
                    Ok(true)
                }
                Predicate::Or(items) => {
                    for item in items {
                        if item.evaluate(ctx).await? {
                            return Ok(true);
                        }
                    }
                    Ok(false)
                }
                Predicate::Not(item) => Ok(!item.evaluate(ctx).await?),
                Predicate::Leaf(leaf) => leaf.evaluate(ctx).await,
            }
        })
    }
}

impl<L> Predicate<L> {
    /// Visit every leaf in declaration order.
    pub fn leaves(&self) -> Vec<&L> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a L>) {
        match self {
            Predicate::Always => {}
            Predicate::And(items) | Predicate::Or(items) => {
                for item in items {
                    item.collect_leaves(out);
                }
            }
            Predicate::Not(item) => item.collect_leaves(out),
            Predicate::Leaf(leaf) => out.push(leaf),
        }
    }
}

impl<L> From<L> for Predicate<L> {
    fn from(leaf: L) -> Self {
        Predicate::Leaf(leaf)
    }
}

impl<L: fmt::Display> fmt::Display for Predicate<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Always => write!(f, "always"),
            Predicate::And(items) => write_list(f, "and", items),
            Predicate::Or(items) => write_list(f, "or", items),
            Predicate::Not(item) => write!(f, "not({item})"),
            Predicate::Leaf(leaf) => write!(f, "{leaf}"),
        }
    }
}

fn write_list<L: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    op: &str,
    items: &[Predicate<L>],
) -> fmt::Result {
    write!(f, "{op}(")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    write!(f, ")")
}

/// Identity predicate.
pub fn always<L>() -> Predicate<L> {
    Predicate::Always
}

pub fn and<L>(items: impl IntoIterator<Item = Predicate<L>>) -> Predicate<L> {
    Predicate::And(items.into_iter().collect())
}

pub fn or<L>(items: impl IntoIterator<Item = Predicate<L>>) -> Predicate<L> {
    Predicate::Or(items.into_iter().collect())
}

pub fn not<L>(item: Predicate<L>) -> Predicate<L> {
    Predicate::Not(Box::new(item))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CollaboratorError, EvalError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fixed answer plus an invocation counter.
    #[derive(Debug)]
    struct Stub {
        answer: Result<bool, ()>,
        hits: AtomicUsize,
    }

    impl Stub {
        fn new(answer: bool) -> Self {
            Self {
                answer: Ok(answer),
                hits: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                answer: Err(()),
                hits: AtomicUsize::new(0),
            }
        }
    }

    /// Leaf referencing a stub by index in the context.
    #[derive(Debug, Clone, Copy)]
    struct P(usize);

    impl fmt::Display for P {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "p{}", self.0)
        }
    }

    impl Leaf for P {
        type Context = [Stub];

        fn evaluate<'a>(&'a self, ctx: &'a [Stub]) -> BoxFuture<'a, EvalResult<bool>> {
            Box::pin(async move {
                let stub = &ctx[self.0];
                stub.hits.fetch_add(1, Ordering::SeqCst);
                stub
                    .answer
                    .map_err(|_| EvalError::from(CollaboratorError::new("stub", "down")))
            })
        }
    }

    fn p(i: usize) -> Predicate<P> {
        Predicate::Leaf(P(i))
    }

    #[tokio::test]
    async fn and_short_circuits_on_false() {
        let stubs = [Stub::new(false), Stub::new(true)];
        assert!(!and([p(0), p(1)]).evaluate(&stubs).await.unwrap());
        assert_eq!(stubs[1].hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn or_short_circuits_on_true() {
        let stubs = [Stub::new(true), Stub::new(false)];
        assert!(or([p(0), p(1)]).evaluate(&stubs).await.unwrap());
        assert_eq!(stubs[1].hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_and_is_true_empty_or_is_false() {
        let stubs: [Stub; 0] = [];
        assert!(and::<P>([]).evaluate(&stubs).await.unwrap());
        assert!(!or::<P>([]).evaluate(&stubs).await.unwrap());
    }

    #[tokio::test]
    async fn not_and_always() {
        let stubs = [Stub::new(false)];
        assert!(not(p(0)).evaluate(&stubs).await.unwrap());
        assert!(!not(always::<P>()).evaluate(&stubs).await.unwrap());
    }

    #[tokio::test]
    async fn error_is_not_a_boolean() {
        let stubs = [Stub::failing(), Stub::new(true)];
        let err = or([p(0), p(1)]).evaluate(&stubs).await.unwrap_err();
        assert!(matches!(err, EvalError::Collaborator(_)));
        assert_eq!(stubs[1].hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reevaluation_is_stable() {
        let stubs = [Stub::new(true), Stub::new(false)];
        let pred = and([p(0), not(p(1))]);
        assert!(pred.evaluate(&stubs).await.unwrap());
        assert!(pred.evaluate(&stubs).await.unwrap());
    }

    #[test]
    fn display_and_leaves() {
        let pred = and([p(0), or([p(1), not(p(2))]), always()]);
        assert_eq!(pred.to_string(), "and(p0, or(p1, not(p2)), always)");
        let idx: Vec<usize> = pred.leaves().iter().map(|l| l.0).collect();
        assert_eq!(idx, vec![0, 1, 2]);
    }
}
