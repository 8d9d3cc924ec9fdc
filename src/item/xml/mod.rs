/// XML side of an import: parsing source files and turning record elements into documents.
///
/// A source file is decoded and parsed in full into an [`XmlDocument`]. The
/// [`XmlRecordReader`] then yields every element carrying the record tag, in
/// document order, and the [`DocumentConverter`] maps each of them to a
/// [`mongodb::bson::Document`].
///
/// # Examples
///
/// ```
/// use mongodb::bson::doc;
/// use xml2mongo::core::item::{ItemProcessor, ItemReader};
/// use xml2mongo::item::xml::{DocumentConverter, XmlDocument, XmlRecordReaderBuilder};
///
/// let xml = r#"
/// <catalog>
///   <product id="P001" available="true">
///     <name>Wireless Headphones</name>
///     <price>79.99</price>
///   </product>
///   <discontinued id="P000"/>
///   <product id="P002" available="false">
///     <name>USB-C Cable</name>
///   </product>
/// </catalog>
/// "#;
///
/// let document = XmlDocument::parse(xml).unwrap();
/// let reader = XmlRecordReaderBuilder::new()
///     .tag("product")
///     .from_document(&document);
/// let converter = DocumentConverter::new();
///
/// let mut records = Vec::new();
/// while let Some(element) = reader.read().unwrap() {
///     records.push(converter.process(&element).unwrap());
/// }
///
/// assert_eq!(records.len(), 2);
/// assert_eq!(
///     records[0],
///     doc! {
///         "product": {
///             "id": "P001",
///             "available": "true",
///             "name": { "text": "Wireless Headphones" },
///             "price": { "text": "79.99" },
///         }
///     }
/// );
/// assert_eq!(
///     records[1],
///     doc! {
///         "product": {
///             "id": "P002",
///             "available": "false",
///             "name": { "text": "USB-C Cable" },
///         }
///     }
/// );
/// ```
pub mod converter;
pub mod element;
pub mod xml_reader;

pub use converter::DocumentConverter;
pub use element::{Element, XmlDocument};
pub use xml_reader::{XmlRecordReader, XmlRecordReaderBuilder};
