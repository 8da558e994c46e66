use secrecy::SecretString;

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub master_secret: SecretString,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(master_secret: SecretString) -> Self {
        Self { master_secret }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new(SecretString::from("master".to_string()));
        assert_eq!(args.master_secret.expose_secret(), "master");
    }

    #[test]
    fn test_debug_redacts_the_secret() {
        let args = GlobalArgs::new(SecretString::from("s3cr3t-value".to_string()));
        assert!(!format!("{args:?}").contains("s3cr3t-value"));
    }
}
