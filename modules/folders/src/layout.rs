use sqlmill_core::{FolderKind, RunPolicy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationsFolder {
    pub kind: FolderKind,
    /// Directory name under the scripts root.
    pub folder_name: String,
    pub policy: RunPolicy,
}

impl MigrationsFolder {
    pub fn new(kind: FolderKind) -> Self {
        MigrationsFolder { folder_name: kind.default_folder_name().to_string(), policy: kind.default_policy(), kind }
    }
}

/// Every folder known to a run, including `down`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderLayout {
    folders: Vec<MigrationsFolder>,
}

impl Default for FolderLayout {
    fn default() -> Self {
        FolderLayout::standard()
    }
}

impl FolderLayout {
    pub fn standard() -> Self {
        let mut folders: Vec<MigrationsFolder> = FolderKind::FORWARD.iter().cloned().map(MigrationsFolder::new).collect();
        folders.push(MigrationsFolder::new(FolderKind::Down));
        FolderLayout { folders }
    }

    pub fn with_folder_name(mut self, kind: &FolderKind, folder_name: impl Into<String>) -> Self {
        let folder_name = folder_name.into();
        if let Some(folder) = self.folders.iter_mut().find(|f| &f.kind == kind) {
            folder.folder_name = folder_name;
        }
        self
    }

    pub fn with_policy(mut self, kind: &FolderKind, policy: RunPolicy) -> Self {
        if let Some(folder) = self.folders.iter_mut().find(|f| &f.kind == kind) {
            folder.policy = policy;
        }
        self
    }

    /// Declares an extra run-every-time group. Duplicates are ignored.
    pub fn with_everytime_group(mut self, folder_name: impl Into<String>) -> Self {
        let kind = FolderKind::Everytime(folder_name.into());
        if self.get(&kind).is_none() {
            self.folders.push(MigrationsFolder::new(kind));
        }
        self
    }

    pub fn get(&self, kind: &FolderKind) -> Option<&MigrationsFolder> {
        self.folders.iter().find(|f| &f.kind == kind)
    }

    pub fn all(&self) -> &[MigrationsFolder] {
        &self.folders
    }

    /// Folders in execution order, without `down`.
    pub fn forward(&self) -> Vec<&MigrationsFolder> {
        let mut plan: Vec<&MigrationsFolder> = self.folders.iter().filter(|f| f.kind.runs_forward()).collect();
        plan.sort_by_key(|f| f.kind.priority());
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_forward_order() {
        let layout = FolderLayout::standard();
        let names: Vec<&str> = layout.forward().iter().map(|f| f.folder_name.as_str()).collect();
        assert_eq!(names, vec!["runFirst", "up", "functions", "views", "sprocs", "permissions"]);
        assert!(layout.get(&FolderKind::Down).is_some());
    }

    #[test]
    fn everytime_groups_follow_permissions_in_declared_order() {
        let layout = FolderLayout::standard().with_everytime_group("seed").with_everytime_group("audit").with_everytime_group("seed");
        let forward = layout.forward();
        assert_eq!(forward.len(), 8);
        assert_eq!(forward[6].folder_name, "seed");
        assert_eq!(forward[7].folder_name, "audit");
        assert_eq!(forward[7].policy, RunPolicy::EveryTime);
    }

    #[test]
    fn overrides_apply_to_one_kind() {
        let layout = FolderLayout::standard()
            .with_folder_name(&FolderKind::Up, "migrations")
            .with_policy(&FolderKind::Views, RunPolicy::IfChanged);
        assert_eq!(layout.get(&FolderKind::Up).unwrap().folder_name, "migrations");
        assert_eq!(layout.get(&FolderKind::Up).unwrap().policy, RunPolicy::Once);
        assert_eq!(layout.get(&FolderKind::Views).unwrap().policy, RunPolicy::IfChanged);
        assert_eq!(layout.get(&FolderKind::Sprocs).unwrap().policy, RunPolicy::EveryTime);
    }
}
