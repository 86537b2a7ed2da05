// File: ./src/model/display.rs
use crate::model::item::Student;

pub trait StudentDisplay {
    fn dob_short(&self) -> Option<String>;
    fn unique_name(&self, roster: &[Student]) -> String;
}

impl StudentDisplay for Student {
    /// `DD/MM` taken from the ISO birth date.
    fn dob_short(&self) -> Option<String> {
        let dob = self.dob.as_deref()?.trim();
        let mut parts = dob.split('-').skip(1);
        let month = parts.next()?;
        let day = parts.next()?;
        if month.is_empty() || day.is_empty() {
            return None;
        }
        Some(format!("{}/{}", day, month))
    }

    /// Full name, disambiguated with the birthday when the roster holds
    /// another student of the same name: `Nguyễn Văn Tuấn (14/05)`.
    fn unique_name(&self, roster: &[Student]) -> String {
        let namesakes = roster
            .iter()
            .filter(|s| s.full_name == self.full_name)
            .count();
        if namesakes > 1
            && let Some(short) = self.dob_short()
        {
            return format!("{} ({})", self.full_name, short);
        }
        self.full_name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_name_only_when_needed() {
        let a = Student::new("1", "Nguyễn Văn Tuấn", "8B03").with_dob("2012-05-14");
        let b = Student::new("2", "Nguyễn Văn Tuấn", "8B03").with_dob("2012-10-27");
        let c = Student::new("3", "Lê Minh", "8B03").with_dob("2012-01-26");
        let roster = vec![a.clone(), b.clone(), c.clone()];

        assert_eq!(a.unique_name(&roster), "Nguyễn Văn Tuấn (14/05)");
        assert_eq!(b.unique_name(&roster), "Nguyễn Văn Tuấn (27/10)");
        assert_eq!(c.unique_name(&roster), "Lê Minh");
    }

    #[test]
    fn unique_name_without_dob_is_plain() {
        let a = Student::new("1", "Trần Thị Hà", "8B03");
        let b = Student::new("2", "Trần Thị Hà", "6A03");
        assert_eq!(a.unique_name(&[a.clone(), b]), "Trần Thị Hà");
    }
}
