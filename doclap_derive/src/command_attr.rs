use syn::{Token, parse::Parse, parse::ParseStream};

#[derive(Debug, Default)]
pub(crate) struct CommandAttr {
    pub name: Option<String>,
    pub marker: Option<syn::Ident>,
}

impl CommandAttr {
    pub(crate) fn name(&self, function: &syn::Ident) -> String {
        self.name.clone().unwrap_or_else(|| function.to_string())
    }

    pub(crate) fn marker(&self, function: &syn::Ident) -> syn::Ident {
        self.marker.clone().unwrap_or_else(|| {
            syn::Ident::new(
                &format!("{}Command", pascal_case(&function.to_string())),
                function.span(),
            )
        })
    }
}

impl Parse for CommandAttr {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut attr = CommandAttr::default();

        if input.peek(syn::LitStr) {
            let name_lit: syn::LitStr = input.parse()?;
            attr.name = Some(name_lit.value());
            return Ok(attr);
        }

        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;

            match ident.to_string().as_str() {
                "name" => {
                    let _eq: Token![=] = input.parse()?;
                    let name_lit: syn::LitStr = input.parse()?;
                    attr.name = Some(name_lit.value());
                }
                "marker" => {
                    let _eq: Token![=] = input.parse()?;
                    attr.marker = Some(input.parse()?);
                }
                _ => {
                    return Err(syn::Error::new(ident.span(), "unknown parameter"));
                }
            }

            if input.peek(Token![,]) {
                let _comma: Token![,] = input.parse()?;
            }
        }
        Ok(attr)
    }
}

fn pascal_case(name: &str) -> String {
    name.trim_start_matches("r#")
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::format_ident;

    #[test]
    fn test_defaults() {
        let attr: CommandAttr = syn::parse_str("").unwrap();
        let function = format_ident!("add_numbers");
        assert_eq!(attr.name(&function), "add_numbers");
        assert_eq!(attr.marker(&function), "AddNumbersCommand");
    }

    #[test]
    fn test_overrides() {
        let attr: CommandAttr = syn::parse_str(r#"name = "sum", marker = Summer"#).unwrap();
        let function = format_ident!("add_numbers");
        assert_eq!(attr.name(&function), "sum");
        assert_eq!(attr.marker(&function), "Summer");

        let attr: CommandAttr = syn::parse_str(r#""sum""#).unwrap();
        assert_eq!(attr.name(&function), "sum");
    }

    #[test]
    fn test_unknown_parameter() {
        assert!(syn::parse_str::<CommandAttr>("path = \"x\"").is_err());
    }
}
