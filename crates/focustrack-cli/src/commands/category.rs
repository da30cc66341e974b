use clap::Subcommand;
use focustrack_core::ConfigFile;

#[derive(Subcommand)]
pub enum CategoryAction {
    /// List categories; the active one is marked with '*'
    List,
    /// Attribute new sessions to a category
    Use {
        name: String,
    },
    /// Stop attributing sessions to a category
    Clear,
    /// Add a custom category
    Add {
        name: String,
        /// Emoji or short marker shown next to the name
        #[arg(long, default_value = "🏷️")]
        icon: String,
    },
    /// Remove a custom category
    Remove {
        name: String,
    },
}

pub fn run(action: CategoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let file = ConfigFile::default_location()?;
    match action {
        CategoryAction::List => {
            let config = file.load()?;
            let active = config.active_category().map(|c| c.name.as_str());
            for category in &config.categories {
                let marker = if Some(category.name.as_str()) == active { '*' } else { ' ' };
                let builtin = if config.is_builtin_category(&category.name) {
                    " (built in)"
                } else {
                    ""
                };
                println!("{marker} {} {}{builtin}", category.icon, category.name);
            }
        }
        CategoryAction::Use { name } => {
            file.update(|config| config.use_category(&name))?;
            println!("active category: {name}");
        }
        CategoryAction::Clear => {
            file.update(|config| {
                config.clear_active_category();
                Ok(())
            })?;
            println!("no active category");
        }
        CategoryAction::Add { name, icon } => {
            file.update(|config| config.add_category(&name, &icon))?;
            println!("category added: {icon} {}", name.trim());
        }
        CategoryAction::Remove { name } => {
            file.update(|config| config.remove_category(&name))?;
            println!("category removed: {name}");
        }
    }
    Ok(())
}
