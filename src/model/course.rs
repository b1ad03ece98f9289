//! The fixed course taxonomy lectures are sorted into.


/// A course that lectures can belong to. `id` is what lecture records
/// reference in their `course_id`.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Course {
    pub(crate) id: &'static str,
    pub(crate) name: &'static str,
    pub(crate) code: &'static str,
}

/// Academic level grouping a number of courses.
#[derive(Debug)]
pub(crate) struct Level {
    pub(crate) id: &'static str,
    pub(crate) name: &'static str,
    pub(crate) courses: &'static [Course],
}

impl Course {
    /// Looks up a course by its ID. Case-sensitive, as the remote source
    /// stores the ID verbatim.
    pub(crate) fn find(id: &str) -> Option<&'static Course> {
        Self::all().find(|c| c.id == id)
    }

    pub(crate) fn all() -> impl Iterator<Item = &'static Course> {
        LEVELS.iter().flat_map(|level| level.courses)
    }

    /// Whether `query` is contained in the course's name or code, ignoring
    /// case. A blank query matches every course.
    pub(crate) fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        self.name.to_lowercase().contains(&query) || self.code.to_lowercase().contains(&query)
    }

    /// All courses whose name or code contains `query`, see [`Self::matches`].
    pub(crate) fn search(query: &str) -> impl Iterator<Item = &'static Course> + '_ {
        Self::all().filter(move |c| c.matches(query))
    }

    /// Returns the level this course is part of.
    pub(crate) fn level(&self) -> &'static Level {
        LEVELS.iter()
            .find(|level| level.courses.iter().any(|c| c.id == self.id))
            .expect("course not part of any level")
    }
}

macro_rules! courses {
    ($($id:literal => $name:literal, $code:literal;)*) => {
        &[$( Course { id: $id, name: $name, code: $code } ),*]
    };
}

pub(crate) static LEVELS: &[Level] = &[
    Level {
        id: "foundation",
        name: "Foundation",
        courses: courses! {
            "Python" => "Python", "F101";
            "Math-1" => "Math-1", "F102";
            "CT" => "CT", "F103";
            "Math-2" => "Math-2", "F104";
            "Stats-1" => "Stats-1", "F105";
            "Stats-2" => "Stats-2", "F106";
            "English-1" => "English-1", "F107";
            "English-2" => "English-2", "F108";
        },
    },
    Level {
        id: "diploma",
        name: "Diploma",
        courses: courses! {
            "JAVA" => "JAVA", "D201";
            "PDSA" => "PDSA", "D202";
            "DBMS" => "DBMS", "D203";
            "App-Dev-1" => "App-Dev-1", "D204";
            "App-Dev-2" => "App-Dev-2", "D205";
            "SC" => "SC", "D206";
            "TDS" => "TDS", "D207";
            "MLF" => "MLF", "D208";
            "MLP" => "MLP", "D209";
            "MLT" => "MLT", "D210";
            "BDMS" => "BDMS", "D211";
            "BA" => "BA", "D212";
        },
    },
    Level {
        id: "bsc",
        name: "BSc",
        courses: courses! {
            "bsc-1" => "Artificial Intelligence", "B301";
            "bsc-2" => "Machine Learning", "B302";
            "bsc-3" => "Cloud Computing", "B303";
            "bsc-4" => "Big Data Analytics", "B304";
            "bsc-5" => "Computer Graphics", "B305";
            "bsc-6" => "Cybersecurity", "B306";
            "bsc-7" => "Distributed Systems", "B307";
            "bsc-8" => "Software Project Management", "B308";
        },
    },
    Level {
        id: "bs",
        name: "BS",
        courses: courses! {
            "bs-1" => "Software Eng.", "BS401";
            "bs-2" => "Software Testing", "BS402";
            "bs-3" => "AI: Search Method", "BS403";
            "bs-4" => "Deep Learning", "BS404";
            "bs-5" => "SFPG", "BS405";
            "bs-6" => "BDBN", "BS406";
            "bs-7" => "DVD", "BS407";
            "bs-8" => "STML", "BS408";
        },
    },
];


#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn ids_are_unique() {
        let mut seen = HashSet::new();
        for course in Course::all() {
            assert!(seen.insert(course.id), "duplicate course ID {}", course.id);
        }
        assert_eq!(seen.len(), 36);
    }

    #[test]
    fn lookup() {
        let ml = Course::find("bsc-2").unwrap();
        assert_eq!(ml.name, "Machine Learning");
        assert_eq!(ml.level().name, "BSc");
        assert!(Course::find("dbms").is_none());
    }

    #[test]
    fn search_by_name_or_code() {
        let ids = |q: &str| Course::search(q).map(|c| c.id).collect::<Vec<_>>();

        assert_eq!(ids("machine"), ["bsc-2"]);
        assert_eq!(ids("MATH"), ["Math-1", "Math-2"]);
        assert_eq!(ids("b30"), ["bsc-1", "bsc-2", "bsc-3", "bsc-4", "bsc-5", "bsc-6", "bsc-7", "bsc-8"]);
        assert_eq!(ids("d203"), ["DBMS"]);
        assert!(ids("quantum").is_empty());
        assert_eq!(Course::search("  ").count(), 36);
    }
}
