use std::ops::Index;

use super::{Expr, Package};
use crate::error::{PackageError, Result};

/// Insertion-ordered collection of packages keyed by name.
#[derive(Debug, Clone, Default)]
pub struct PackageCollection {
    packages: Vec<Package>,
}

impl PackageCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a package, replacing any package with the same name in place.
    pub fn add(&mut self, package: Package) {
        match self.position(package.name()) {
            Some(index) => self.packages[index] = package,
            None => self.packages.push(package),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Result<&Package> {
        self.find(name)
            .ok_or_else(|| PackageError::NoSuchPackage(name.to_string()))
    }

    pub fn find(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.name() == name)
    }

    pub(crate) fn find_mut(&mut self, name: &str) -> Option<&mut Package> {
        self.packages.iter_mut().find(|p| p.name() == name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Package> {
        let index = self.position(name)?;
        Some(self.packages.remove(index))
    }

    /// Packages matching `expr`, in their original order.
    pub fn filter(&self, expr: &Expr) -> PackageCollection {
        PackageCollection {
            packages: self
                .packages
                .iter()
                .filter(|p| expr.evaluate(p))
                .cloned()
                .collect(),
        }
    }

    pub fn root_package(&self) -> Option<&Package> {
        self.packages.iter().find(|p| p.is_root())
    }

    pub fn installed_packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.iter().filter(|p| !p.is_root())
    }

    pub fn names(&self) -> Vec<&str> {
        self.packages.iter().map(|p| p.name()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Package> {
        self.packages.iter()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.packages.iter().position(|p| p.name() == name)
    }
}

impl Index<&str> for PackageCollection {
    type Output = Package;

    fn index(&self, name: &str) -> &Package {
        match self.find(name) {
            Some(package) => package,
            None => panic!("no package named \"{}\" in the collection", name),
        }
    }
}

impl<'a> IntoIterator for &'a PackageCollection {
    type Item = &'a Package;
    type IntoIter = std::slice::Iter<'a, Package>;

    fn into_iter(self) -> Self::IntoIter {
        self.packages.iter()
    }
}

impl FromIterator<Package> for PackageCollection {
    fn from_iter<I: IntoIterator<Item = Package>>(iter: I) -> Self {
        let mut collection = PackageCollection::new();
        for package in iter {
            collection.add(package);
        }
        collection
    }
}
