//! Resolving a tag to the group and participants it names

use crate::types::*;

/// Where an expense goes and who shares it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub group_id: GroupId,
    /// `None` for ungrouped expenses
    pub group_name: Option<String>,
    pub participants: Vec<UserId>,
    pub payer: UserId,
}

/// Case-fold and drop whitespace, so `"Flat Mates"` and `"flatmates"` agree
pub fn normalize_group_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Resolves tags against one snapshot of the user's groups
pub struct GroupResolver<'a> {
    groups: &'a [Group],
    current_user: UserId,
}

impl<'a> GroupResolver<'a> {
    pub fn new(groups: &'a [Group], current_user: UserId) -> Self {
        Self {
            groups,
            current_user,
        }
    }

    /// Resolve a tag. The current user always pays.
    ///
    /// When several groups normalize to the same name, the first in listing
    /// order wins and a warning names the others.
    pub fn resolve(&self, tag: &Tag) -> ReconcileResult<Resolution> {
        match tag.target() {
            TagTarget::Ungrouped => Ok(Resolution {
                group_id: UNGROUPED,
                group_name: None,
                participants: vec![self.current_user],
                payer: self.current_user,
            }),
            TagTarget::Group(name) => {
                let group = self.find_group(name)?;
                Ok(Resolution {
                    group_id: group.id,
                    group_name: Some(group.name.clone()),
                    participants: group.member_ids(),
                    payer: self.current_user,
                })
            }
            TagTarget::Malformed => Err(ReconcileError::MalformedTag(tag.to_string())),
        }
    }

    /// Find a group by name, ignoring case and whitespace
    pub fn find_group(&self, name: &str) -> ReconcileResult<&'a Group> {
        let wanted = normalize_group_name(name);
        let mut matches = self
            .groups
            .iter()
            .filter(|group| normalize_group_name(&group.name) == wanted);

        let group = matches
            .next()
            .ok_or_else(|| ReconcileError::GroupNotFound(name.to_string()))?;

        let shadowed: Vec<GroupId> = matches.map(|g| g.id).collect();
        if !shadowed.is_empty() {
            tracing::warn!(
                "Group name '{}' is ambiguous; using group {} and ignoring {:?}",
                name,
                group.id,
                shadowed
            );
        }

        Ok(group)
    }
}
