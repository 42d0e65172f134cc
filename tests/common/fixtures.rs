/// A class with a docblock, two methods and a constant.
pub const SERVICE_CLASS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<class xmlns="http://xml.phpdox.net/src" name="Service" full="App\Service" namespace="App" abstract="false">
  <docblock>
    <description compact="Runs &amp; stops things"/>
  </docblock>
  <constant name="VERSION" value="'1.0'"/>
  <method name="run" visibility="public">
    <parameter name="job"/>
    <parameter name="retries"/>
  </method>
  <method name="stop" visibility="protected"/>
</class>"#;

pub const REPOSITORY_INTERFACE: &str = r#"<interface xmlns="http://xml.phpdox.net/src" name="Repository" full="App/Data:Repository">
  <method name="find"/>
</interface>"#;

pub const LOGGABLE_TRAIT: &str = r#"<trait xmlns="http://xml.phpdox.net/src" name="Loggable" full="App\Loggable">
  <method name="log"/>
</trait>"#;

pub const INDEX: &str = r#"<index xmlns="http://xml.phpdox.net/src">
  <namespace name="App">
    <class name="Service"/>
    <interface name="Repository"/>
    <trait name="Loggable"/>
  </namespace>
</index>"#;

pub const SOURCE_TREE: &str = r#"<source xmlns="http://xml.phpdox.net/src">
  <dir name="src"><file name="Service.php"/></dir>
</source>"#;

pub const PROJECT: &str = r#"<project xmlns="http://xml.phpdox.net/config" name="Demo" source="src"/>"#;

/// A mixed node set: attribute, same-named namespaced and plain children.
pub const MIXED: &str = r#"<root xmlns:dox="http://xml.phpdox.net/src" name="attr">
  <name>plain</name>
  <dox:name>namespaced</dox:name>
  <dox:item n="1"/>
  <dox:item n="2"/>
  <dox:item n="3"/>
  <other xmlns="urn:other">elsewhere</other>
</root>"#;

/// The templates of a complete theme, as `(file name, source)` pairs.
pub fn theme() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "class.html.hbs",
            r#"<h1>{{get class "name"}}</h1><p>{{get class "docblock" "description" "compact"}}</p><ul>{{#each (items (get class "method"))}}<li>{{get this "name"}}({{count (get this "parameter")}})</li>{{/each}}</ul>"#,
        ),
        ("interface.html.hbs", r#"<h1>{{get interface "name"}}</h1>"#),
        ("trait.html.hbs", r#"<h1>{{get trait "name"}}</h1>{{#if interface}}leaked{{/if}}"#),
        ("index.html.hbs", r#"<h1>{{get project "name"}}</h1>"#),
        (
            "namespaces.html.hbs",
            r#"{{#each (items (get index "namespace"))}}{{get this "name"}}{{/each}}"#,
        ),
        (
            "classes.html.hbs",
            r#"{{#each (items (query index "dox:namespace/dox:class"))}}<a href="classes/{{id (get this "name")}}.{{../file_extension}}">{{get this "name"}}</a>{{/each}}"#,
        ),
        ("interfaces.html.hbs", r#"{{count (query index "//dox:interface")}}"#),
        ("traits.html.hbs", r#"{{count (query index "//dox:trait")}}"#),
    ]
}
