//! Aggregate synthesis.
//!
//! Records meeting the aggregate criteria become [`Aggregate`]s with a
//! named-parameter [`Constructor`], one parameter per field in declaration
//! order. Every other record becomes a [`Class`] without one.

use crate::bir::{Aggregate, Class, Constructor, Docstring, Field, Node, Parameter};

use super::assemble::Placed;
use super::overload::{Grouped, GroupedRecord};

/// Turn grouped items into assembler input.
pub fn synthesize_aggregates(grouped: Vec<Grouped>) -> Vec<Placed> {
    let mut aggregates = 0usize;
    let placed: Vec<Placed> = grouped
        .into_iter()
        .map(|item| match item {
            Grouped::Namespace(n) => Placed::Namespace(n),
            Grouped::Banner(b) => Placed::Banner(b),
            Grouped::Functions(set) => Placed::Node(Node::OverloadSet(set)),
            Grouped::Constant(k) => Placed::Node(Node::Constant(k)),
            Grouped::Record(r) => {
                let node = record_node(r);
                if matches!(node, Node::Aggregate(_)) {
                    aggregates += 1;
                }
                Placed::Node(node)
            }
        })
        .collect();
    tracing::debug!("{} aggregates synthesized", aggregates);
    placed
}

fn record_node(record: GroupedRecord) -> Node {
    if record.is_aggregate {
        Node::Aggregate(Aggregate {
            constructor: constructor_for(&record.fields, record.docstring.as_ref()),
            qualified_name: record.qualified_name,
            fields: record.fields,
            methods: record.methods,
            docstring: record.docstring,
            location: record.location,
        })
    } else {
        Node::Class(Class {
            qualified_name: record.qualified_name,
            methods: record.methods,
            fields: record.fields,
            docstring: record.docstring,
            location: record.location,
        })
    }
}

/// Constructor taking every field by name. Fields without an initializer
/// give required parameters.
pub fn constructor_for(fields: &[Field], docstring: Option<&Docstring>) -> Constructor {
    Constructor {
        params: fields
            .iter()
            .map(|field| Parameter {
                name: field.name.clone(),
                ty: field.ty.clone(),
                default: field.default.clone(),
                unnamed: false,
            })
            .collect(),
        docstring: docstring.cloned(),
    }
}
