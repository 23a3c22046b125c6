//! Not-null contract detection and synthesis.
//!
//! Everything here works on one immutable [`crate::document::Document`]
//! snapshot: detection reads the tree and its semantic model, synthesis
//! returns replacement subtrees that the caller swaps into a new root.

pub(crate) mod anchor;
pub(crate) mod assertion;
pub(crate) mod block;
pub(crate) mod imports;
pub(crate) mod method_like;
pub(crate) mod nullability;
pub(crate) mod predicate;
pub(crate) mod synth;

pub(crate) use block::ContractBlock;
pub(crate) use method_like::MethodLike;

/// Namespace that declares the `Contract` class.
pub(crate) const CONTRACTS_NAMESPACE: &str = "System.Diagnostics.Contracts";
