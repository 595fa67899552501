use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A query-type operation that receives execution-time hooks.
///
/// The set is fixed: registration attaches hooks to exactly these names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryOp {
    /// `find`
    Find,
    /// `findOne`
    FindOne,
    /// `count`
    Count,
    /// `countDocuments`
    CountDocuments,
    /// `estimatedDocumentCount`
    EstimatedDocumentCount,
    /// `findOneAndUpdate`
    FindOneAndUpdate,
    /// `findOneAndRemove`
    FindOneAndRemove,
    /// `findOneAndDelete`
    FindOneAndDelete,
    /// `deleteOne`
    DeleteOne,
    /// `deleteMany`
    DeleteMany,
    /// `remove`
    Remove,
    /// `aggregate`
    Aggregate,
}

impl QueryOp {
    /// Every covered operation, in registration order.
    pub const ALL: [QueryOp; 12] = [
        QueryOp::Find,
        QueryOp::FindOne,
        QueryOp::Count,
        QueryOp::CountDocuments,
        QueryOp::EstimatedDocumentCount,
        QueryOp::FindOneAndUpdate,
        QueryOp::FindOneAndRemove,
        QueryOp::FindOneAndDelete,
        QueryOp::DeleteOne,
        QueryOp::DeleteMany,
        QueryOp::Remove,
        QueryOp::Aggregate,
    ];

    /// The host-side operation name.
    pub fn as_str(self) -> &'static str {
        match self {
            QueryOp::Find => "find",
            QueryOp::FindOne => "findOne",
            QueryOp::Count => "count",
            QueryOp::CountDocuments => "countDocuments",
            QueryOp::EstimatedDocumentCount => "estimatedDocumentCount",
            QueryOp::FindOneAndUpdate => "findOneAndUpdate",
            QueryOp::FindOneAndRemove => "findOneAndRemove",
            QueryOp::FindOneAndDelete => "findOneAndDelete",
            QueryOp::DeleteOne => "deleteOne",
            QueryOp::DeleteMany => "deleteMany",
            QueryOp::Remove => "remove",
            QueryOp::Aggregate => "aggregate",
        }
    }

}

impl fmt::Display for QueryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing a name outside the covered set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not an instrumented operation: {0}")]
pub struct UnknownOp(pub String);

impl FromStr for QueryOp {
    type Err = UnknownOp;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueryOp::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| UnknownOp(s.to_string()))
    }
}
