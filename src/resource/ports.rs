// src/resource/ports.rs

use std::collections::BTreeMap;

use crate::errors::Result;
use crate::naming::BindContext;
use crate::resource::Resource;

/// Declared shape of a task's inputs or outputs.
#[derive(Debug, Default)]
pub enum Ports {
    #[default]
    None,
    Single(Box<dyn Resource>),
    Ordered(Vec<Box<dyn Resource>>),
    Named(BTreeMap<String, Box<dyn Resource>>),
}

impl Ports {
    pub fn single(resource: impl Resource + 'static) -> Self {
        Ports::Single(Box::new(resource))
    }

    pub fn ordered<I, R>(resources: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Resource + 'static,
    {
        Ports::Ordered(
            resources
                .into_iter()
                .map(|r| Box::new(r) as Box<dyn Resource>)
                .collect(),
        )
    }

    pub fn named<I, K, R>(resources: I) -> Self
    where
        I: IntoIterator<Item = (K, R)>,
        K: Into<String>,
        R: Resource + 'static,
    {
        Ports::Named(
            resources
                .into_iter()
                .map(|(k, r)| (k.into(), Box::new(r) as Box<dyn Resource>))
                .collect(),
        )
    }

    /// Flat, ordered view of every resource.
    pub fn resources(&self) -> Vec<&dyn Resource> {
        match self {
            Ports::None => Vec::new(),
            Ports::Single(r) => vec![r.as_ref()],
            Ports::Ordered(rs) => rs.iter().map(|r| r.as_ref()).collect(),
            Ports::Named(rs) => rs.values().map(|r| r.as_ref()).collect(),
        }
    }

    pub fn resources_mut(&mut self) -> Vec<&mut (dyn Resource + 'static)> {
        match self {
            Ports::None => Vec::new(),
            Ports::Single(r) => vec![r.as_mut()],
            Ports::Ordered(rs) => rs.iter_mut().map(|r| r.as_mut()).collect(),
            Ports::Named(rs) => rs.values_mut().map(|r| r.as_mut()).collect(),
        }
    }

    /// Look a resource up by key: the map key for named ports, the decimal
    /// index for ordered ports. A single resource answers to `"0"`.
    pub fn get(&self, key: &str) -> Option<&dyn Resource> {
        match self {
            Ports::None => None,
            Ports::Single(r) => (key == "0").then_some(r.as_ref()),
            Ports::Ordered(rs) => key
                .parse::<usize>()
                .ok()
                .and_then(|i| rs.get(i))
                .map(|r| r.as_ref()),
            Ports::Named(rs) => rs.get(key).map(|r| r.as_ref()),
        }
    }

    /// The only resource of a single port.
    pub fn first(&self) -> Option<&dyn Resource> {
        self.resources().into_iter().next()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        match self {
            Ports::None => 0,
            Ports::Single(_) => 1,
            Ports::Ordered(rs) => rs.len(),
            Ports::Named(rs) => rs.len(),
        }
    }

    pub fn bind_all(&mut self, ctx: &BindContext) -> Result<()> {
        for resource in self.resources_mut() {
            resource.bind(ctx)?;
        }
        Ok(())
    }
}
