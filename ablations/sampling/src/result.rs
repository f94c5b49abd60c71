//! 实验结果.

use crate::algos::Profile;
use std::io::{self, Write};

/// 将 `profile` 的结果写进 `w` 中.
fn describe_into<W: Write>(name: &str, p: &Profile, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    #[inline]
    fn f64_to_display(f: Option<f64>) -> String {
        match f {
            Some(f) => format!("{f:.6}"),
            None => "/".to_string(),
        }
    }

    let s = p.get_sections();
    writeln!(w, "Profile `{name}`:")?;
    writeln!(w, "{S4}Measured frames: {}", p.get_measured())?;
    writeln!(w, "{S4}Failed frames: {}", p.get_failed())?;
    writeln!(
        w,
        "{S4}Cross sections: {} valid of {} planned ({} on border, {} without lumen)",
        s.valid, s.planned, s.on_border, s.no_lumen
    )?;
    writeln!(w, "{S4}Lumen width MAE: {}", f64_to_display(p.get_lumen_mae()))?;
    writeln!(w, "{S4}Tubule width MAE: {}", f64_to_display(p.get_tubule_mae()))?;
    writeln!(w, "{S4}Measuring total time: {} us", p.get_target_time_us())?;
    writeln!(
        w,
        "{S4}Measuring average time: {} us",
        f64_to_display(p.get_avg_target_time_us())
    )?;
    writeln!(w, "{S4}Total machine time: {} us", p.get_real_time_us())?;
    let t = p.get_most_time_consuming().map(|d| d.as_micros());
    match t {
        Some(t) => write!(w, "{S4}Most time-consuming frame costs {t} us"),
        None => write!(w, "{S4}Most time-consuming frame costs /"),
    }
}

/// 消融实验最终结果.
pub struct AblationResult {
    data: Vec<(&'static str, Profile)>,
}

impl AblationResult {
    pub fn from_iter<I: IntoIterator<Item = (&'static str, Profile)>>(it: I) -> Self {
        Self {
            data: it.into_iter().collect(),
        }
    }

    /// 把运行结果写进 `w` 中.
    pub fn analyze<W: Write>(&self, mut w: W) -> io::Result<()> {
        utils::sep_to(&mut w)?;
        for (key, profile) in self.data.iter() {
            describe_into(key, profile, &mut w)?;
            writeln!(w)?;
            utils::sep_to(&mut w)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_lists_every_profile() {
        let result = AblationResult::from_iter([("a", Profile::new()), ("b", Profile::new())]);
        let mut buf = Vec::new();
        result.analyze(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Profile `a`:"));
        assert!(text.contains("Profile `b`:"));
        assert!(text.contains("Lumen width MAE: /"));
    }
}
