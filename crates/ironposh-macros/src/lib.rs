use proc_macro::TokenStream;
use proc_macro2::{Ident, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::{parse_macro_input, Data, DeriveInput, Fields, Generics, Type, TypePath};

/// Derives `TagValue` for structs where every field is `Option<Tag<'a, ValueType, TagName>>`.
///
/// Assumes all fields are optional `Tag`s and generates an `append_to_element` that
/// pushes each present tag as a child element, skipping the ones left `None`.
#[proc_macro_derive(SimpleTagValue)]
pub fn derive_simple_tag_value(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    TokenStream::from(impl_simple_tag_value(&input))
}

/// Derives `XmlDeserialize` for structs where every field is `Option<Tag<'a, ValueType, TagName>>`.
///
/// Generates a visitor that matches each child element's tag name against the
/// `TagName` each field's `Tag<..>` is parameterized with.
#[proc_macro_derive(SimpleXmlDeserialize)]
pub fn derive_simple_xml_deserialize(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    TokenStream::from(impl_simple_xml_deserialize(&input))
}

fn impl_simple_tag_value(input: &DeriveInput) -> TokenStream2 {
    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => panic!("SimpleTagValue can only be derived for structs with named fields"),
        },
        _ => panic!("SimpleTagValue can only be derived for structs"),
    };

    let field_names: Vec<&Ident> = fields
        .iter()
        .map(|field| field.ident.as_ref().unwrap())
        .collect();

    let field_list = quote! { #(#field_names),* };

    let pushes: Vec<TokenStream2> = fields
        .iter()
        .map(|field| {
            let field_name = field.ident.as_ref().unwrap();
            if is_option_type(&field.ty) {
                quote! {
                    if let Some(tag) = #field_name {
                        children.push(tag.into_element());
                    }
                }
            } else {
                quote! {
                    children.push(#field_name.into_element());
                }
            }
        })
        .collect();

    quote! {
        impl #impl_generics crate::cores::TagValue<'a> for #name #ty_generics #where_clause {
            fn append_to_element(self, element: psrp_xml::builder::Element<'a>) -> psrp_xml::builder::Element<'a> {
                let Self { #field_list } = self;

                let mut children = Vec::new();

                #(#pushes)*

                element.add_children(children)
            }
        }
    }
}

fn is_option_type(ty: &Type) -> bool {
    if let Type::Path(TypePath { path, .. }) = ty {
        path.segments.last().is_some_and(|segment| segment.ident == "Option")
    } else {
        false
    }
}

fn impl_simple_xml_deserialize(input: &DeriveInput) -> TokenStream2 {
    let name = &input.ident;
    let generics = &input.generics;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => panic!("SimpleXmlDeserialize can only be derived for structs with named fields"),
        },
        _ => panic!("SimpleXmlDeserialize can only be derived for structs"),
    };

    let visitor_name = format_ident!("{}Visitor", name);

    let field_entries: Vec<SimpleFieldEntry> = fields
        .iter()
        .map(|field| {
            let field_name = field.ident.as_ref().unwrap().clone();
            let field_type = field.ty.clone();
            let tag_name_type = extract_tag_name_type(&field_type);
            let required = !is_option_type(&field_type);

            SimpleFieldEntry {
                field_name,
                field_type,
                tag_name_type,
                required,
            }
        })
        .collect();

    let visitor_struct = generate_simple_visitor_struct(&visitor_name, generics, &field_entries);
    let xml_visitor_impl =
        generate_simple_xml_visitor_impl(&visitor_name, name, generics, &field_entries);
    let xml_deserialize_impl = generate_xml_deserialize_impl(name, &visitor_name, generics);

    quote! {
        #visitor_struct
        #xml_visitor_impl
        #xml_deserialize_impl
    }
}

struct SimpleFieldEntry {
    field_name: Ident,
    field_type: Type,
    tag_name_type: Option<Ident>,
    required: bool,
}

fn generate_simple_visitor_struct(
    visitor_name: &Ident,
    generics: &Generics,
    field_entries: &[SimpleFieldEntry],
) -> TokenStream2 {
    let (impl_generics, _ty_generics, where_clause) = generics.split_for_impl();

    // Visitor fields are always Option, even for required struct fields, so the
    // visitor itself can derive Default and accumulate as children stream in.
    let visitor_fields: Vec<TokenStream2> = field_entries
        .iter()
        .map(|entry| {
            let field_name = &entry.field_name;
            let field_type = &entry.field_type;
            if entry.required {
                quote! { pub #field_name: Option<#field_type> }
            } else {
                quote! { pub #field_name: #field_type }
            }
        })
        .collect();

    quote! {
        #[derive(Debug, Clone, Default)]
        pub struct #visitor_name #impl_generics #where_clause {
            #(#visitor_fields),*
        }
    }
}

fn generate_simple_xml_visitor_impl(
    visitor_name: &Ident,
    struct_name: &Ident,
    generics: &Generics,
    field_entries: &[SimpleFieldEntry],
) -> TokenStream2 {
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let match_arms: Vec<TokenStream2> = field_entries
        .iter()
        .filter_map(|entry| {
            let tag_name_type = entry.tag_name_type.as_ref()?;
            let field_name = &entry.field_name;
            Some(quote! {
                crate::cores::tag_name::#tag_name_type::TAG_NAME => {
                    self.#field_name = Some(psrp_xml::parser::XmlDeserialize::from_node(child)?);
                }
            })
        })
        .collect();

    let field_names: Vec<&Ident> = field_entries.iter().map(|f| &f.field_name).collect();
    let field_list = quote! { #(#field_names),* };

    let finish_fields: Vec<TokenStream2> = field_entries
        .iter()
        .map(|entry| {
            let field_name = &entry.field_name;
            if entry.required {
                quote! {
                    #field_name: #field_name.ok_or_else(|| psrp_xml::XmlError::InvalidXml(
                        format!("Missing required element {}", stringify!(#field_name))
                    ))?
                }
            } else {
                quote! { #field_name }
            }
        })
        .collect();

    quote! {
        impl #impl_generics psrp_xml::parser::XmlVisitor<'a> for #visitor_name #ty_generics #where_clause {
            type Value = #struct_name #ty_generics;

            fn visit_children(
                &mut self,
                children: impl Iterator<Item = psrp_xml::parser::Node<'a, 'a>>,
            ) -> Result<(), psrp_xml::XmlError> {
                for child in children {
                    if !child.is_element() {
                        continue;
                    }

                    let tag_name = child.tag_name().name();

                    match tag_name {
                        #(#match_arms)*
                        _ => {
                            return Err(psrp_xml::XmlError::InvalidXml(format!(
                                "Unknown tag in {}: {tag_name}", stringify!(#struct_name)
                            )));
                        }
                    }
                }

                Ok(())
            }

            fn visit_node(&mut self, node: psrp_xml::parser::Node<'a, 'a>) -> Result<(), psrp_xml::XmlError> {
                let children: Vec<_> = node.children().collect();
                self.visit_children(children.into_iter())?;
                Ok(())
            }

            fn finish(self) -> Result<Self::Value, psrp_xml::XmlError> {
                let Self { #field_list } = self;

                Ok(#struct_name {
                    #(#finish_fields),*
                })
            }
        }
    }
}

fn extract_tag_name_type(ty: &Type) -> Option<Ident> {
    if let Type::Path(TypePath { path, .. }) = ty {
        for segment in &path.segments {
            if segment.ident == "Tag" || segment.ident == "Option" {
                if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                    for arg in &args.args {
                        if let syn::GenericArgument::Type(inner_type) = arg {
                            if let Some(tag_name) = extract_tag_name_from_tag_type(inner_type) {
                                return Some(tag_name);
                            }
                        }
                    }

                    if segment.ident == "Tag" && args.args.len() >= 3 {
                        if let syn::GenericArgument::Type(Type::Path(TypePath { path, .. })) =
                            &args.args[2]
                        {
                            if let Some(segment) = path.segments.last() {
                                return Some(segment.ident.clone());
                            }
                        }
                    }
                }
            }
        }
    }
    None
}

fn extract_tag_name_from_tag_type(ty: &Type) -> Option<Ident> {
    if let Type::Path(TypePath { path, .. }) = ty {
        for segment in &path.segments {
            if segment.ident == "Tag" {
                if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                    if args.args.len() >= 3 {
                        if let syn::GenericArgument::Type(Type::Path(TypePath { path, .. })) =
                            &args.args[2]
                        {
                            if let Some(segment) = path.segments.last() {
                                return Some(segment.ident.clone());
                            }
                        }
                    }
                }
            }
        }
    }
    None
}

fn generate_xml_deserialize_impl(
    struct_name: &Ident,
    visitor_name: &Ident,
    generics: &Generics,
) -> TokenStream2 {
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    quote! {
        impl #impl_generics psrp_xml::parser::XmlDeserialize<'a> for #struct_name #ty_generics #where_clause {
            type Visitor = #visitor_name #ty_generics;

            fn visitor() -> Self::Visitor {
                #visitor_name::default()
            }

            fn from_node(node: psrp_xml::parser::Node<'a, 'a>) -> Result<Self, psrp_xml::XmlError> {
                psrp_xml::parser::NodeDeserializer::new(node).deserialize(Self::visitor())
            }
        }
    }
}
