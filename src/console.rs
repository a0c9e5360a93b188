use crossterm::style::Stylize;

use crate::config::BuildSetting;

/// Print the command about to run.
pub fn command(cmd: &str) {
    println!("{}\n\t--> {}", "Docker command:".green().bold(), cmd.green());
}

pub fn heading(text: &str) {
    println!("{}", text.cyan().bold());
}

pub fn success(text: &str) {
    println!("{}", text.green());
}

pub fn error(text: &str) {
    eprintln!("{} {}", "error:".red().bold(), text.red());
}

/// One line per setting: `name (user) image, flags`.
pub fn describe_setting(setting: &BuildSetting) -> String {
    let mut line = format!(
        "{} ({}) image={}",
        setting.name(),
        setting.user,
        setting.docker_file.as_deref().unwrap_or("-")
    );
    if !setting.gpu.is_empty() {
        let ids: Vec<String> = setting.gpu.iter().map(u32::to_string).collect();
        line.push_str(&format!(" gpu={}", ids.join(",")));
    }
    if setting.gui {
        line.push_str(" gui");
    }
    if let (Some(user), Some(host)) = (&setting.ssh_user, &setting.ssh_ip) {
        line.push_str(&format!(" ssh={user}@{host}"));
    }
    line
}

pub fn list_settings(settings: &[BuildSetting]) {
    heading("Build settings:");
    for setting in settings {
        println!("  {}", describe_setting(setting));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_minimal_setting() {
        let setting = BuildSetting {
            build_name: Some("cpu".into()),
            user: "common".into(),
            ..BuildSetting::default()
        };
        assert_eq!(describe_setting(&setting), "cpu (common) image=-");
    }

    #[test]
    fn describe_full_setting() {
        let setting = BuildSetting {
            build_name: Some("train".into()),
            user: "alice".into(),
            docker_file: Some("gpu".into()),
            gpu: vec![0, 1],
            gui: true,
            ssh_user: Some("bob".into()),
            ssh_ip: Some("gpu-box".into()),
            ..BuildSetting::default()
        };
        assert_eq!(
            describe_setting(&setting),
            "train (alice) image=gpu gpu=0,1 gui ssh=bob@gpu-box"
        );
    }
}
