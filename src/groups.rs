//! Group explicitly installed packages for the `pkglist/grouped` listing.
//!
//! Big groups go first. A group is left out when every one of its members
//! was already listed under an earlier group, which hides meta-groups that a
//! larger group fully covers.
use crate::pacman::Package;
use std::collections::{BTreeMap, HashSet};

/// Packages without a group and without a known packager.
pub const AUR_GROUP: &str = "aur";
/// Packages without a group from a known packager.
pub const UNGROUPED: &str = "ungrouped";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageGroup<'p> {
    pub name: String,
    pub packages: Vec<&'p Package>,
}

pub fn group_packages<'p, I>(packages: I) -> Vec<PackageGroup<'p>>
where
    I: IntoIterator<Item = &'p Package>,
{
    let mut by_name: BTreeMap<String, Vec<&'p Package>> = BTreeMap::new();
    for package in packages {
        if package.groups.is_empty() {
            let synthetic = if package.has_unknown_packager() {
                AUR_GROUP
            } else {
                UNGROUPED
            };
            by_name.entry(synthetic.to_string()).or_default().push(package);
        } else {
            for group in &package.groups {
                by_name.entry(group.clone()).or_default().push(package);
            }
        }
    }

    let mut ordered: Vec<(String, Vec<&'p Package>)> = by_name.into_iter().collect();
    ordered.sort_by(|(a_name, a), (b_name, b)| b.len().cmp(&a.len()).then_with(|| a_name.cmp(b_name)));

    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut emitted = Vec::new();
    for (name, members) in ordered {
        if members.iter().all(|pkg| seen.contains(&pkg.identity())) {
            continue;
        }
        seen.extend(members.iter().map(|pkg| pkg.identity()));
        emitted.push(PackageGroup {
            name,
            packages: members,
        });
    }
    emitted
}
