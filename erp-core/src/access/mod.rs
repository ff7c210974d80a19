//! Module and page access gating.
//!
//! Every screen belongs to exactly one module. A user sees a page when they
//! are an administrator, or when the page's module is enabled for them and
//! the page itself has not been switched off.

pub mod handlers;
pub mod store;

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

pub use handlers::my_access_handler;
pub use store::{ensure_page, load_access};

/// Functional area of the ERP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    /// Employee and company administration
    Management,
    /// Customers, orders, billing, collections and receivables
    Sales,
    /// Employee reading log
    Reading,
}

impl Module {
    pub const ALL: [Module; 3] = [Module::Management, Module::Sales, Module::Reading];

    pub fn key(&self) -> &'static str {
        match self {
            Module::Management => "management",
            Module::Sales => "sales",
            Module::Reading => "reading",
        }
    }
}

/// Individual screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Employees,
    Companies,
    AccessControl,
    Customers,
    Orders,
    Billings,
    Collections,
    Receivables,
    ReadingLogs,
}

impl Page {
    pub const ALL: [Page; 9] = [
        Page::Employees,
        Page::Companies,
        Page::AccessControl,
        Page::Customers,
        Page::Orders,
        Page::Billings,
        Page::Collections,
        Page::Receivables,
        Page::ReadingLogs,
    ];

    pub fn module(&self) -> Module {
        match self {
            Page::Employees | Page::Companies | Page::AccessControl => Module::Management,
            Page::Customers
            | Page::Orders
            | Page::Billings
            | Page::Collections
            | Page::Receivables => Module::Sales,
            Page::ReadingLogs => Module::Reading,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Page::Employees => "employees",
            Page::Companies => "companies",
            Page::AccessControl => "access_control",
            Page::Customers => "customers",
            Page::Orders => "orders",
            Page::Billings => "billings",
            Page::Collections => "collections",
            Page::Receivables => "receivables",
            Page::ReadingLogs => "reading_logs",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKey(pub String);

impl FromStr for Module {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Module::ALL
            .into_iter()
            .find(|m| m.key() == s)
            .ok_or_else(|| UnknownKey(s.to_string()))
    }
}

impl FromStr for Page {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Page::ALL
            .into_iter()
            .find(|p| p.key() == s)
            .ok_or_else(|| UnknownKey(s.to_string()))
    }
}

/// Capability flags of one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessTable {
    pub is_admin: bool,
    pub modules: HashSet<Module>,

    /// Explicit page flags; a page with no entry follows its module
    pub pages: HashMap<Page, bool>,
}

impl AccessTable {
    pub fn admin() -> Self {
        Self {
            is_admin: true,
            ..Self::default()
        }
    }

    pub fn can_access_module(&self, module: Module) -> bool {
        self.is_admin || self.modules.contains(&module)
    }

    pub fn can_access(&self, page: Page) -> bool {
        if self.is_admin {
            return true;
        }
        self.modules.contains(&page.module()) && self.pages.get(&page).copied().unwrap_or(true)
    }

    pub fn visible_modules(&self) -> Vec<Module> {
        Module::ALL
            .into_iter()
            .filter(|m| self.can_access_module(*m))
            .collect()
    }

    pub fn visible_pages(&self) -> Vec<Page> {
        Page::ALL.into_iter().filter(|p| self.can_access(*p)).collect()
    }
}
