//! Identity resolution and dictionary assembly.
//!
//! [`DictionaryBuilder`] turns the top level of a [`ScanTree`] into the final
//! [`Dictionary`]. For every loaded dictionary it resolves an [`Identity`]:
//! a normalized, lower-cased key plus a display name. Keys are compared
//! case-insensitively, so `User.json` and `user.json` in one directory
//! collide.
//!
//! # Examples
//!
//! ```
//! use dl_core::{ScanOptions, Resource};
//! use dl_scanner::{DictionaryBuilder, ScanEntry, ScanRules, ScanTree};
//! use serde_json::json;
//!
//! let options = ScanOptions::new("api");
//! let rules = ScanRules::compile(&options)?;
//!
//! let mut tree = ScanTree::new(false);
//! tree.insert("UserController", ScanEntry::Loaded(Resource::from(json!({ "find": true }))));
//!
//! let dict = DictionaryBuilder::new(&options, &rules).build(tree)?;
//! assert_eq!(
//!     dict.get("usercontroller").map(|r| r.to_json()),
//!     Some(json!({ "find": true, "identity": "usercontroller", "globalId": "UserController" }))
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use dl_core::{Dictionary, Resource, ScanOptions, fx_hash_set};
use tracing::trace;

use crate::error::ScanError;
use crate::filter::ScanRules;
use crate::walker::{ScanEntry, ScanTree};

/// Field a resource uses to declare its identity.
pub const IDENTITY_FIELD: &str = "identity";

/// Field a resource uses to declare its global name.
pub const GLOBAL_NAME_FIELD: &str = "globalId";

/// The resolved naming of one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Normalized, lower-cased identity.
    pub identity: String,
    /// Display name; keeps the original casing.
    pub global_name: String,
}

impl Identity {
    /// Resolves an identity from a filename key and optional declarations.
    ///
    /// An undeclared (or empty) identity is derived from `key` through the
    /// rewrite rule. Backslashes become `/`. The global name defaults to the
    /// identity before lower-casing.
    ///
    /// # Examples
    ///
    /// ```
    /// use dl_core::ScanOptions;
    /// use dl_scanner::{Identity, ScanRules};
    ///
    /// let options = ScanOptions::new(".").with_identity_rewrite("Controller$", "");
    /// let rules = ScanRules::compile(&options)?;
    ///
    /// let id = Identity::resolve("PetController", None, None, &rules, "");
    /// assert_eq!(id.identity, "pet");
    /// assert_eq!(id.global_name, "Pet");
    /// # Ok::<(), dl_core::ConfigError>(())
    /// ```
    #[must_use]
    pub fn resolve(
        key: &str,
        declared_identity: Option<&str>,
        declared_global_name: Option<&str>,
        rules: &ScanRules,
        replacement: &str,
    ) -> Self {
        let identity = match declared_identity.filter(|id| !id.is_empty()) {
            Some(declared) => declared.to_owned(),
            None => rules.rewrite_identity(key, replacement),
        };
        let identity = identity.replace('\\', "/");

        let global_name = declared_global_name
            .filter(|name| !name.is_empty())
            .map_or_else(|| identity.clone(), ToOwned::to_owned);

        Self {
            identity: identity.to_lowercase(),
            global_name,
        }
    }

    /// Returns the dictionary key this identity implies.
    #[must_use]
    pub fn key(&self, use_global_name: bool) -> &str {
        if use_global_name {
            &self.global_name
        } else {
            &self.identity
        }
    }

    /// Writes both names back into `dict`.
    pub fn annotate(&self, dict: &Dictionary) {
        dict.insert(IDENTITY_FIELD, Resource::from(self.identity.as_str()));
        dict.insert(GLOBAL_NAME_FIELD, Resource::from(self.global_name.as_str()));
    }
}

/// Assembles the normal-mode result dictionary.
#[derive(Debug)]
pub struct DictionaryBuilder<'a> {
    options: &'a ScanOptions,
    rules: &'a ScanRules,
}

impl<'a> DictionaryBuilder<'a> {
    /// Creates a builder for one scan.
    #[must_use]
    pub const fn new(options: &'a ScanOptions, rules: &'a ScanRules) -> Self {
        Self { options, rules }
    }

    /// Builds the dictionary from the tree's top-level entries.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::DuplicateKey`] when two entries resolve to the same
    /// key (compared case-insensitively) and duplicates are not allowed.
    pub fn build(&self, tree: ScanTree) -> Result<Dictionary, ScanError> {
        let resolve = self.options.resolve_identity && !self.options.skip_load;
        let dict = Dictionary::new();
        let mut seen = fx_hash_set::<String>();

        for (filename, entry) in tree.into_entries() {
            let (key, value) = match entry {
                ScanEntry::Unvisited | ScanEntry::Loaded(Resource::Absent) => continue,
                ScanEntry::Present => (filename, Resource::present()),
                ScanEntry::Loaded(resource) if !resolve => (filename, resource),
                ScanEntry::Directory(subtree) if !resolve => (filename, subtree.to_resource()),
                ScanEntry::Loaded(resource) => self.resolve(&filename, resource),
                ScanEntry::Directory(subtree) => self.resolve(&filename, subtree.to_resource()),
            };

            if !seen.insert(key.to_lowercase()) && !self.options.allow_duplicate_keys {
                return Err(ScanError::DuplicateKey { key });
            }
            dict.insert(key, value);
        }

        Ok(dict)
    }

    /// Resolves the key for one resource, annotating dictionaries in place.
    fn resolve(&self, filename: &str, resource: Resource) -> (String, Resource) {
        let replacement = self.options.identity_replacement.as_str();
        let use_global = self.options.use_global_name_for_key;

        let Resource::Dict(dict) = &resource else {
            let identity = Identity::resolve(filename, None, None, self.rules, replacement);
            return (identity.key(use_global).to_owned(), resource);
        };

        let declared_identity = dict.get_str(IDENTITY_FIELD);
        let declared_global = dict.get_str(GLOBAL_NAME_FIELD);
        let identity = Identity::resolve(
            filename,
            declared_identity.as_deref(),
            declared_global.as_deref(),
            self.rules,
            replacement,
        );
        identity.annotate(dict);
        trace!(filename, identity = %identity.identity, global_name = %identity.global_name, "Resolved identity");

        (identity.key(use_global).to_owned(), resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rules(options: &ScanOptions) -> ScanRules {
        ScanRules::compile(options).unwrap()
    }

    fn loaded(value: serde_json::Value) -> ScanEntry {
        ScanEntry::Loaded(Resource::from(value))
    }

    fn build(options: &ScanOptions, tree: ScanTree) -> Result<Dictionary, ScanError> {
        let rules = rules(options);
        DictionaryBuilder::new(options, &rules).build(tree)
    }

    #[test]
    fn test_resolve_derives_from_filename() {
        let rules = rules(&ScanOptions::new("."));
        let id = Identity::resolve("UserController", None, None, &rules, "");
        assert_eq!(id.identity, "usercontroller");
        assert_eq!(id.global_name, "UserController");
        assert_eq!(id.key(true), "UserController");
        assert_eq!(id.key(false), "usercontroller");
    }

    #[test]
    fn test_resolve_prefers_declared_names() {
        let rules = rules(&ScanOptions::new("."));
        let id = Identity::resolve("file", Some("Custom"), Some("CustomGlobal"), &rules, "");
        assert_eq!(id.identity, "custom");
        assert_eq!(id.global_name, "CustomGlobal");

        let empty = Identity::resolve("file", Some(""), None, &rules, "");
        assert_eq!(empty.identity, "file");
    }

    #[test]
    fn test_resolve_normalizes_backslashes() {
        let rules = rules(&ScanOptions::new("."));
        let id = Identity::resolve(r"admin\User", None, None, &rules, "");
        assert_eq!(id.identity, "admin/user");
        assert_eq!(id.global_name, "admin/User");
    }

    #[test]
    fn test_resolve_rewrite_skips_declared_identity() {
        let rules = rules(&ScanOptions::new(".").with_identity_rewrite("Controller$", ""));
        let id = Identity::resolve("PetController", Some("AnimalController"), None, &rules, "");
        assert_eq!(id.identity, "animalcontroller");
    }

    #[test]
    fn test_build_annotates_dictionaries() {
        let options = ScanOptions::new(".");
        let mut tree = ScanTree::new(false);
        tree.insert("User", loaded(json!({ "attributes": {} })));
        tree.insert("helper", loaded(json!("text")));

        let dict = build(&options, tree).unwrap();
        insta::assert_json_snapshot!(dict.to_json(), @r#"
        {
          "helper": "text",
          "user": {
            "attributes": {},
            "globalId": "User",
            "identity": "user"
          }
        }
        "#);
    }

    #[test]
    fn test_build_uses_global_name_for_key() {
        let mut options = ScanOptions::new(".");
        options.use_global_name_for_key = true;
        let mut tree = ScanTree::new(false);
        tree.insert("User", loaded(json!({ "globalId": "Person" })));

        let dict = build(&options, tree).unwrap();
        assert!(dict.contains_key("Person"));
        assert!(!dict.contains_key("user"));
    }

    #[test]
    fn test_build_rejects_case_insensitive_duplicates() {
        let mut options = ScanOptions::new(".");
        let tree = || {
            let mut tree = ScanTree::new(false);
            tree.insert("User", loaded(json!({})));
            tree.insert("user", loaded(json!({})));
            tree
        };

        let err = build(&options, tree()).err();
        assert_eq!(err.as_ref().and_then(ScanError::key), Some("user"));

        options.allow_duplicate_keys = true;
        assert_eq!(build(&options, tree()).unwrap().len(), 1);
    }

    #[test]
    fn test_build_detects_collisions_between_declared_identities() {
        let options = ScanOptions::new(".");
        let mut tree = ScanTree::new(false);
        tree.insert("a", loaded(json!({ "identity": "Shared" })));
        tree.insert("b", loaded(json!({ "identity": "shared" })));

        let err = build(&options, tree).err();
        assert_eq!(err.as_ref().and_then(ScanError::key), Some("shared"));
    }

    #[test]
    fn test_build_skips_absent_and_unvisited() {
        let options = ScanOptions::new(".");
        let mut tree = ScanTree::new(false);
        tree.insert("gone", ScanEntry::Loaded(Resource::Absent));
        tree.insert("deep", ScanEntry::Unvisited);
        tree.insert("kept", loaded(json!(1)));

        let dict = build(&options, tree).unwrap();
        assert_eq!(dict.keys(), ["kept"]);
    }

    #[test]
    fn test_build_without_identity_keeps_filenames() {
        let mut options = ScanOptions::new(".");
        options.resolve_identity = false;
        let mut tree = ScanTree::new(false);
        tree.insert("User", loaded(json!({ "a": 1 })));

        let dict = build(&options, tree).unwrap();
        assert_eq!(dict.to_json(), json!({ "User": { "a": 1 } }));
    }

    #[test]
    fn test_build_with_skip_load_keeps_markers() {
        let mut options = ScanOptions::new(".");
        options.skip_load = true;
        let mut tree = ScanTree::new(false);
        tree.insert("User", ScanEntry::Present);

        let dict = build(&options, tree).unwrap();
        assert_eq!(dict.to_json(), json!({ "User": true }));
    }

    #[test]
    fn test_build_annotates_directory_subtrees() {
        let options = ScanOptions::new(".");
        let mut sub = ScanTree::new(false);
        sub.insert("a", loaded(json!(1)));
        let mut tree = ScanTree::new(false);
        tree.insert("Admin", ScanEntry::Directory(sub));

        let dict = build(&options, tree).unwrap();
        assert_eq!(
            dict.to_json(),
            json!({ "admin": { "a": 1, "identity": "admin", "globalId": "Admin" } })
        );
    }
}
