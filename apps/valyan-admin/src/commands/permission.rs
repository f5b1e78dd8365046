//! Permission catalog listing

use valyan_authz::catalog::permissions_grouped;

pub fn cmd_permission_list(category: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let grouped = permissions_grouped();

    if let Some(category) = category {
        if !grouped.contains_key(category) {
            return Err(format!("Unknown permission category '{}'", category).into());
        }
    }

    for (name, definitions) in grouped
        .iter()
        .filter(|(name, _)| category.map_or(true, |c| c == **name))
    {
        println!("{}:", name);
        for def in definitions {
            let marker = if def.is_field_level { " [field]" } else { "" };
            println!("  {:<40} {}{}", def.code, def.description, marker);
        }
        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_all_and_by_category() {
        cmd_permission_list(None).unwrap();
        cmd_permission_list(Some("Patient")).unwrap();
        assert!(cmd_permission_list(Some("Nope")).is_err());
    }
}
