//! HTML pages, rendered with minijinja from templates embedded in the binary.

use di::{inject, injectable};
use minijinja::{Environment, context};

const LOGIN_TEMPLATE: &str = include_str!("../../templates/login.html");
const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");

pub struct PageTemplates {
    env: Environment<'static>,
}

#[injectable]
impl PageTemplates {
    #[inject]
    pub fn create() -> PageTemplates {
        let mut env = Environment::new();
        env.set_loader(|name| {
            Ok(match name {
                "login.html" => Some(LOGIN_TEMPLATE.to_owned()),
                "index.html" => Some(INDEX_TEMPLATE.to_owned()),
                _ => None,
            })
        });

        PageTemplates { env }
    }
}

impl PageTemplates {
    pub fn login(&self, error: Option<&str>) -> Result<String, minijinja::Error> {
        self.env
            .get_template("login.html")?
            .render(context! { error => error })
    }

    pub fn index(&self, username: &str) -> Result<String, minijinja::Error> {
        self.env
            .get_template("index.html")?
            .render(context! { username => username })
    }
}
