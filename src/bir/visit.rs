//! Emitter interface.
//!
//! [`walk`] traverses a [`Bir`] depth-first in source-declaration order and
//! calls the matching `visit_*` method for every node. The BIR is only
//! borrowed, so it can be walked any number of times.

use super::{Aggregate, Bir, Class, Constant, Namespace, Node, OverloadSet, SectionBanner};

/// Back-end consuming the BIR.
pub trait Emitter {
    type Error;

    /// Called before the namespace's children.
    fn visit_namespace(&mut self, namespace: &Namespace) -> Result<(), Self::Error>;

    /// Called after the namespace's children.
    fn leave_namespace(&mut self, _namespace: &Namespace) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_aggregate(&mut self, aggregate: &Aggregate) -> Result<(), Self::Error>;

    fn visit_class(&mut self, class: &Class) -> Result<(), Self::Error>;

    fn visit_overload_set(&mut self, set: &OverloadSet) -> Result<(), Self::Error>;

    fn visit_constant(&mut self, constant: &Constant) -> Result<(), Self::Error>;

    /// Grouping hint; ignored unless the emitter cares.
    fn visit_banner(&mut self, _banner: &SectionBanner) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Drive `emitter` over `bir`. The root namespace itself is visited too.
pub fn walk<E: Emitter + ?Sized>(bir: &Bir, emitter: &mut E) -> Result<(), E::Error> {
    walk_namespace(&bir.root, emitter)
}

fn walk_namespace<E: Emitter + ?Sized>(ns: &Namespace, emitter: &mut E) -> Result<(), E::Error> {
    emitter.visit_namespace(ns)?;

    let mut banners = ns.banners.iter().peekable();
    for (index, child) in ns.children.iter().enumerate() {
        while let Some(banner) = banners.next_if(|b| b.position <= index) {
            emitter.visit_banner(banner)?;
        }
        match child {
            Node::Namespace(inner) => walk_namespace(inner, emitter)?,
            Node::Aggregate(a) => emitter.visit_aggregate(a)?,
            Node::Class(c) => emitter.visit_class(c)?,
            Node::OverloadSet(s) => emitter.visit_overload_set(s)?,
            Node::Constant(k) => emitter.visit_constant(k)?,
        }
    }
    for banner in banners {
        emitter.visit_banner(banner)?;
    }

    emitter.leave_namespace(ns)
}
