use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt::{self, Display};

use toolchat_model::ModelTool;

use crate::tool::{AnyTool, Tool, ToolObject};

/// An error that occurred while registering a tool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// A tool with the same name has already been registered.
    DuplicateName(String),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateName(name) => {
                write!(f, "tool `{name}` is registered more than once")
            }
        }
    }
}

impl StdError for RegistryError {}

/// The set of tools available to the model, keyed by name.
///
/// Tools are registered once during setup. After that the registry is only
/// read, and can be shared between conversations.
#[derive(Default)]
pub struct Registry {
    tools: Vec<Box<dyn ToolObject>>,
    index: HashMap<String, usize>,
}

impl Registry {
    /// Creates an empty registry.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool.
    pub fn register<T: Tool>(&mut self, tool: T) -> Result<(), RegistryError> {
        let name = tool.name().to_owned();
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        debug!("registering tool: {name}");
        self.index.insert(name, self.tools.len());
        self.tools.push(Box::new(AnyTool(tool)));
        Ok(())
    }

    /// Returns the declarations of all tools, in registration order.
    #[inline]
    pub fn definitions(&self) -> Vec<ModelTool> {
        self.tools.iter().map(|tool| tool.definition()).collect()
    }

    /// Looks up a tool by name.
    #[inline]
    pub fn resolve(&self, name: &str) -> Option<&dyn ToolObject> {
        self.index.get(name).map(|idx| self.tools[*idx].as_ref())
    }

    /// Returns the names of all tools, in registration order.
    #[inline]
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|tool| tool.name())
    }

    /// Returns the number of registered tools.
    #[inline]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` if no tools are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
