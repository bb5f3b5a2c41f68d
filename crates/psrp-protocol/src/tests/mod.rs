mod command_completion_test;
mod command_xml_tests;
mod creation_xml;
mod creation_xml_roundtrip;
mod error_record_test;
mod parse_real_pipeline_output;
