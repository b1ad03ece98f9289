use crate::{model::{Course, LEVELS}, prelude::*};


pub(crate) fn run(level: Option<&str>, search: Option<&str>) -> Result<()> {
    let levels = LEVELS.iter()
        .filter(|l| level.map_or(true, |id| l.id == id))
        .collect::<Vec<_>>();

    if levels.is_empty() {
        let known = LEVELS.iter().map(|l| l.id).collect::<Vec<_>>().join(", ");
        bail!("unknown level '{}' (known levels: {known})", level.unwrap_or_default());
    }

    let query = search.unwrap_or_default();
    let matching = Course::search(query).collect::<Vec<_>>();
    let mut found = 0;
    for level in levels {
        let courses = level.courses.iter()
            .filter(|c| matching.contains(c))
            .collect::<Vec<&Course>>();
        if courses.is_empty() {
            continue;
        }

        bunt::println!("{$bold}{}{/$} {$dimmed}({}){/$}", level.name, level.id);
        for course in &courses {
            let id = format!("{:<10}", course.id);
            let code = format!("{:<6}", course.code);
            bunt::println!("  {[cyan]} {[dimmed]} {}", id, code, course.name);
        }
        println!();
        found += courses.len();
    }

    if found == 0 {
        bunt::println!("{$dimmed}No courses match '{}'.{/$}", query);
    }

    Ok(())
}
