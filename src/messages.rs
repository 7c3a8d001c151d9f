//! User-facing text in every supported language.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Language of notices and panels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Tr,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::En => f.write_str("en"),
            Language::Tr => f.write_str("tr"),
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "tr" | "turkish" | "türkçe" => Ok(Language::Tr),
            other => Err(format!("unsupported language '{}'", other)),
        }
    }
}

/// Every piece of text shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message<'a> {
    InitStarted,
    InitSucceeded,
    CloneStarted,
    CloneSucceeded,
    EmptyCloneDetected,
    CommitStarted,
    NothingToCommit,
    CommitSucceeded { short_id: &'a str },
    PushStarted,
    PushSucceeded,
    PullStarted,
    PullSucceeded,
    TestingConnection,
    ConnectionSucceeded { branch: &'a str, branch_found: bool },
    MissingCredentials,
    Failed { operation: &'a str, detail: &'a str },

    // Failure guidance
    NetworkUnreachable,
    AuthenticationFailed,
    RepositoryNotFound,
    HostNotFound,

    // Commit messages
    InitialBackupCommit,
    ManualCommitAndPush,

    // First run
    FirstRunTitle,
    FirstRunBody,

    // Status panel
    RepositoryPresent,
    RepositoryAbsent,
}

impl Message<'_> {
    /// Render the message in the given language
    pub fn render(&self, lang: Language) -> String {
        match lang {
            Language::En => self.english(),
            Language::Tr => self.turkish(),
        }
    }

    fn english(&self) -> String {
        match self {
            Message::InitStarted => "Initializing git repository...".into(),
            Message::InitSucceeded => "Git repository initialized!".into(),
            Message::CloneStarted => "Cloning repository...".into(),
            Message::CloneSucceeded => "Repository cloned!".into(),
            Message::EmptyCloneDetected => {
                "Cloned an empty repository. Creating the first commit...".into()
            }
            Message::CommitStarted => "Committing changes...".into(),
            Message::NothingToCommit => "No new changes to commit.".into(),
            Message::CommitSucceeded { short_id } => {
                format!("Changes committed! Commit: {}", short_id)
            }
            Message::PushStarted => "Pushing changes...".into(),
            Message::PushSucceeded => "Changes pushed!".into(),
            Message::PullStarted => "Pulling changes...".into(),
            Message::PullSucceeded => "Changes pulled and merged!".into(),
            Message::TestingConnection => "Testing connection...".into(),
            Message::ConnectionSucceeded { branch, branch_found } => {
                if *branch_found {
                    format!(
                        "Connection and authentication succeeded! Branch '{}' exists on the remote.",
                        branch
                    )
                } else {
                    format!(
                        "Connection and authentication succeeded! WARNING: branch '{}' was not found on the remote!",
                        branch
                    )
                }
            }
            Message::MissingCredentials => {
                "Please fill in the repository URL and access token in the settings.".into()
            }
            Message::Failed { operation, detail } => format!("{} error: {}", operation, detail),
            Message::NetworkUnreachable => {
                "Network error: the server could not be reached. This is a CORS policy or network problem. \
                 Try setting a CORS proxy (e.g. https://cors.isomorphic-git.org) in the settings, \
                 or leave the proxy empty on desktop."
                    .into()
            }
            Message::AuthenticationFailed => {
                "Authentication failed. The access token is invalid, expired, or lacks the 'repo' scope. \
                 If the repository belongs to an organization, check its SSO authorization."
                    .into()
            }
            Message::RepositoryNotFound => "Repository not found. Please check the URL.".into(),
            Message::HostNotFound => {
                "Server not found. Check the URL or your internet connection.".into()
            }
            Message::InitialBackupCommit => "Initial vault backup".into(),
            Message::ManualCommitAndPush => "Manual commit & push".into(),
            Message::FirstRunTitle => "Important: keep your notes safe!".into(),
            Message::FirstRunBody => {
                "This tool versions your notes with git. To minimize the risk of data loss, \
                 follow the instructions carefully and take a manual backup of your existing notes first."
                    .into()
            }
            Message::RepositoryPresent => "A git repository exists in this vault.".into(),
            Message::RepositoryAbsent => "There is no git repository in this vault.".into(),
        }
    }

    fn turkish(&self) -> String {
        match self {
            Message::InitStarted => "Git deposu başlatılıyor...".into(),
            Message::InitSucceeded => "Git deposu başarıyla başlatıldı!".into(),
            Message::CloneStarted => "Depo klonlanıyor...".into(),
            Message::CloneSucceeded => "Depo başarıyla klonlandı!".into(),
            Message::EmptyCloneDetected => {
                "Boş bir depo klonlandı. İlk commit oluşturuluyor...".into()
            }
            Message::CommitStarted => "Değişiklikler kaydediliyor (commit)...".into(),
            Message::NothingToCommit => "Kaydedilecek yeni değişiklik bulunmuyor.".into(),
            Message::CommitSucceeded { short_id } => {
                format!("Değişiklikler başarıyla kaydedildi! Commit: {}", short_id)
            }
            Message::PushStarted => "Değişiklikler gönderiliyor (push)...".into(),
            Message::PushSucceeded => "Değişiklikler başarıyla gönderildi!".into(),
            Message::PullStarted => "Değişiklikler çekiliyor (pull)...".into(),
            Message::PullSucceeded => "Değişiklikler başarıyla çekildi ve birleştirildi!".into(),
            Message::TestingConnection => "Bağlantı test ediliyor...".into(),
            Message::ConnectionSucceeded { branch, branch_found } => {
                if *branch_found {
                    format!(
                        "Bağlantı ve kimlik doğrulama başarılı! '{}' branch'i uzak depoda bulundu.",
                        branch
                    )
                } else {
                    format!(
                        "Bağlantı ve kimlik doğrulama başarılı! UYARI: '{}' branch'i uzak depoda bulunamadı!",
                        branch
                    )
                }
            }
            Message::MissingCredentials => {
                "Lütfen depo URL'sini ve erişim belirtecini ayarlardan girin.".into()
            }
            Message::Failed { operation, detail } => format!("{} hatası: {}", operation, detail),
            Message::NetworkUnreachable => {
                "Ağ hatası: Sunucuya ulaşılamadı. Bu, bir CORS ilkesi veya ağ sorunudur. \
                 Ayarlar'dan bir CORS proxy (örn: https://cors.isomorphic-git.org) ayarlamayı deneyin \
                 veya masaüstünde proxy'yi boş bırakın."
                    .into()
            }
            Message::AuthenticationFailed => {
                "Kimlik doğrulama başarısız. Erişim belirteci geçersiz, süresi dolmuş veya gerekli 'repo' \
                 izinlerine sahip değil. Deponuz bir organizasyona aitse SSO yetkilendirmesini kontrol edin."
                    .into()
            }
            Message::RepositoryNotFound => "Depo bulunamadı. Lütfen URL'yi kontrol edin.".into(),
            Message::HostNotFound => {
                "Sunucu bulunamadı. URL'yi veya internet bağlantınızı kontrol edin.".into()
            }
            Message::InitialBackupCommit => "İlk not yedeği".into(),
            Message::ManualCommitAndPush => "Manuel Commit & Push".into(),
            Message::FirstRunTitle => "Önemli Bilgilendirme: Notlarınızın Güvenliği İçin!".into(),
            Message::FirstRunBody => {
                "Bu araç, notlarınızı Git ile versiyonlamanızı sağlar. Veri kaybı riskini en aza indirmek \
                 için lütfen talimatları dikkatlice takip edin ve mevcut notlarınızın manuel bir yedeğini alın."
                    .into()
            }
            Message::RepositoryPresent => "Bu kasada bir Git deposu mevcut.".into(),
            Message::RepositoryAbsent => "Bu kasada bir Git deposu bulunmuyor.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parse() {
        assert_eq!("EN".parse::<Language>().unwrap(), Language::En);
        assert_eq!("tr".parse::<Language>().unwrap(), Language::Tr);
        assert!("de".parse::<Language>().is_err());
    }

    #[test]
    fn test_render_interpolates() {
        let msg = Message::CommitSucceeded { short_id: "abc1234" };
        assert!(msg.render(Language::En).contains("abc1234"));
        assert!(msg.render(Language::Tr).contains("abc1234"));
    }
}
